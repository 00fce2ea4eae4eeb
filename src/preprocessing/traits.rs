//! Core traits for preprocessing steps.
//!
//! - [`Transformer`]: unfitted, configurable; learns from data.
//! - [`FittedTransformer`]: fitted; applies learned parameters and persists them.
//! - [`Resampler`]: changes the row set itself (class balancing).

use crate::error::FedError;
use crate::serialization::SerializableParams;
use ndarray::{Array1, Array2};

/// Trait for unfitted transformers with hyperparameters.
///
/// # Example
/// ```ignore
/// let fitted = StandardScaler::new().fit(&data)?;
/// let transformed = fitted.transform(&new_data)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`FedError`] if the data is empty or has an incompatible shape.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, FedError>;

    /// Fit the transformer and transform the same data in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, FedError> {
        self.fit(data)?.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// Returns [`FedError::FeatureMismatch`] if the input width differs from the fitted width.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, FedError>;

    /// Reverse the transformation.
    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, FedError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, FedError>
    where
        Self: Sized;

    /// Number of features seen during fit.
    fn n_features_in(&self) -> usize;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), FedError> {
        crate::serialization::save_params(&self.extract_params(), path)
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, FedError>
    where
        Self: Sized,
    {
        let params = crate::serialization::load_params::<Self::Params, _>(path)?;
        Self::from_params(params)
    }
}

/// Trait for steps that add or remove rows rather than transform columns.
///
/// Resampling only ever applies to training data; the test split of a client
/// is left untouched.
pub trait Resampler {
    /// Error returned when the data cannot be resampled.
    type Error: std::error::Error;

    /// Returns the resampled feature matrix and labels.
    fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array2<f64>, Array1<f64>), Self::Error>;
}
