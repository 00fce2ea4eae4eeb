//! Per-client data preparation.
//!
//! Transformers follow a fitted/unfitted split: an unfitted transformer holds
//! only its configuration, `fit` learns parameters from training data and
//! returns a fitted transformer that can be applied to other data and
//! serialized.
//!
//! # Available Transformers
//!
//! - [`StandardScaler`]: Z-score normalization
//! - [`Smote`]: minority-class oversampling by neighbour interpolation
//!
//! # Example
//!
//! ```ignore
//! use fedsurvey::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//!
//! let fitted = StandardScaler::new().fit(&x_train)?;
//! let train_scaled = fitted.transform(&x_train)?;
//! let test_scaled = fitted.transform(&x_test)?;
//! ```

pub mod resampling;
pub mod scaling;
pub mod traits;

pub use resampling::{ResampleError, Smote};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams};
pub use traits::{FittedTransformer, Resampler, Transformer};
