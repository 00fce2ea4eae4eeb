//! Standard Scaler (Z-score normalization).
//!
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean of the fitting data and `s` its population
//! standard deviation. Constant columns get `s = 1`.
//!
//! # Example
//! ```
//! use fedsurvey::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//! use ndarray::array;
//!
//! let data = array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]];
//! let fitted = StandardScaler::new().fit(&data).unwrap();
//! let scaled = fitted.transform(&data).unwrap();
//! assert_eq!(scaled.dim(), (3, 2));
//! ```

use crate::error::FedError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If true, center the data before scaling.
    pub with_mean: bool,
    /// If true, scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    pub config: StandardScalerConfig,
    /// Mean of each feature (zeros if `with_mean` is false).
    pub mean: Vec<f64>,
    /// Standard deviation of each feature (ones if `with_std` is false).
    pub std: Vec<f64>,
    pub n_features: usize,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, FedError> {
        let (rows, cols) = data.dim();
        if rows == 0 {
            return Err(FedError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let mean = match (self.config.with_mean, data.mean_axis(Axis(0))) {
            (true, Some(m)) => m,
            _ => Array1::zeros(cols),
        };

        let std = if self.config.with_std {
            // population std (ddof = 0); constant columns keep their scale
            data.std_axis(Axis(0), 0.0)
                .mapv(|s| if s == 0.0 { 1.0 } else { s })
        } else {
            Array1::ones(cols)
        };

        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean,
            std,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler {
    config: StandardScalerConfig,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    fn check_width(&self, cols: usize) -> Result<(), FedError> {
        if cols != self.mean.len() {
            return Err(FedError::FeatureMismatch {
                expected_features: self.mean.len(),
                got_features: cols,
            });
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, FedError> {
        self.check_width(data.ncols())?;
        let mut out = data.clone();
        if self.config.with_mean {
            out -= &self.mean;
        }
        if self.config.with_std {
            out /= &self.std;
        }
        Ok(out)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, FedError> {
        self.check_width(data.ncols())?;
        let mut out = data.clone();
        if self.config.with_std {
            out *= &self.std;
        }
        if self.config.with_mean {
            out += &self.mean;
        }
        Ok(out)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
            n_features: self.mean.len(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, FedError> {
        if params.mean.len() != params.n_features || params.std.len() != params.n_features {
            return Err(FedError::InvalidShape {
                expected: format!("{} means and stds", params.n_features),
                got: format!("{} means, {} stds", params.mean.len(), params.std.len()),
            });
        }
        Ok(Self {
            config: params.config,
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]]
    }

    #[test]
    fn test_standard_scaler_fit() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let mean = fitted.mean();
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_transform_zero_mean_unit_std() {
        let data = create_test_data();
        let transformed = StandardScaler::new().fit_transform(&data).unwrap();

        let mean = transformed.mean_axis(Axis(0)).unwrap();
        let std = transformed.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(mean[j].abs() < 1e-12, "mean[{}] = {}", j, mean[j]);
            assert!((std[j] - 1.0).abs() < 1e-12, "std[{}] = {}", j, std[j]);
        }
    }

    #[test]
    fn test_standard_scaler_inverse_transform() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let recovered = fitted
            .inverse_transform(&fitted.transform(&data).unwrap())
            .unwrap();
        for (o, r) in data.iter().zip(recovered.iter()) {
            assert!((o - r).abs() < 1e-12);
        }
    }

    #[test]
    fn test_standard_scaler_applies_train_statistics_to_other_data() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let other = array![[1.0 / 3.0, 5.0 / 3.0]];
        let scaled = fitted.transform(&other).unwrap();
        assert!(scaled[[0, 0]].abs() < 1e-12);
        assert!(scaled[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_without_mean_and_std() {
        let data = create_test_data();
        let fitted = StandardScaler::new()
            .with_mean(false)
            .with_std(false)
            .fit(&data)
            .unwrap();
        assert!(fitted.mean().iter().all(|&m| m == 0.0));
        assert!(fitted.std().iter().all(|&s| s == 1.0));
        assert_eq!(fitted.transform(&data).unwrap(), data);
    }

    #[test]
    fn test_standard_scaler_constant_feature() {
        let data = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.std()[0], 1.0);
        assert!((fitted.mean()[0] - 5.0).abs() < 1e-12);
        let scaled = fitted.transform(&data).unwrap();
        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_standard_scaler_feature_mismatch() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let result = fitted.transform(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(
            result,
            Err(FedError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
    }

    #[test]
    fn test_standard_scaler_empty_data() {
        assert!(StandardScaler::new().fit(&Array2::zeros((0, 2))).is_err());
    }

    #[test]
    fn test_standard_scaler_params_roundtrip() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let restored = FittedStandardScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored, fitted);
        assert_eq!(restored.n_features_in(), 2);
    }

    #[test]
    fn test_standard_scaler_save_load_file() -> Result<(), Box<dyn std::error::Error>> {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data)?;

        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("scaler.bin");
        fitted.save_to_file(&path)?;
        let loaded = FittedStandardScaler::load_from_file(&path)?;

        assert_eq!(loaded.transform(&data)?, fitted.transform(&data)?);
        Ok(())
    }
}
