//! Models with their training state encoded in the type.
//!
//! - [`TrainableModel`] is implemented by `Unfitted` models: forward pass,
//!   backward pass and parameter updates.
//! - [`InferenceModel`] is implemented by `Fitted` models: prediction and
//!   persistence.

pub mod logistic;
pub mod state;

pub use logistic::{LogisticModel, LogisticRegression, ModelParameters};
pub use state::{Fitted, Unfitted};

use crate::error::FedError;
use crate::serialization::SerializableParams;

pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic on parameter sets, used by optimizers and aggregation.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;
    /// Largest absolute component, used as a convergence measure on gradients.
    fn max_abs(&self) -> f64;
}

pub trait InferenceModel {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    type ParamsRepr: SerializableParams;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;

    fn extract_params(&self) -> Self::ParamsRepr;
    fn from_params(params: Self::ParamsRepr) -> Result<Self, FedError>
    where
        Self: Sized;

    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), FedError> {
        crate::serialization::save_params(&self.extract_params(), path)
    }

    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, FedError>
    where
        Self: Sized,
    {
        let params = crate::serialization::load_params::<Self::ParamsRepr, _>(path)?;
        Self::from_params(params)
    }
}
