//! # fedsurvey
//!
//! A federated-averaging simulation of a binary logistic classifier trained on
//! survey data partitioned by country.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: models carry their training state in the type system
//!   (`Unfitted` vs `Fitted`); only fitted models predict.
//! - **Training/Inference Separation**: a fitted model holds only its parameters;
//!   losses, regularizers, optimizers and the trainer live in their own modules.
//! - **Deterministic Simulation**: every random decision of a federation run comes
//!   from one injected, seedable generator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedsurvey::dataset::SurveyTable;
//! use fedsurvey::federated::{simulate, SimulationConfig};
//!
//! # fn main() -> Result<(), fedsurvey::FedError> {
//! # let table: SurveyTable = unimplemented!();
//! let config = SimulationConfig::default();
//! let outcome = simulate(&table, &config)?;
//!
//! println!("{}", outcome.report);
//! println!("global accuracy per round: {:?}", outcome.result.metrics.global_accuracies());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: the survey table, in-memory datasets and seeded train/test splitting
//! - `preprocessing`: standard scaling and SMOTE oversampling
//! - `model`: logistic regression with stateful type parameters
//! - `loss`, `regularizers`, `optimizer`, `trainer`: the local training stack
//! - `metrics`: accuracy, log-loss, ROC-AUC, calibration and classification reports
//! - `federated`: partitioning, local training, perturbation, averaging and the round loop
//! - `serialization`: model persistence

pub mod dataset;
pub mod error;
pub mod federated;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod preprocessing;
pub mod regularizers;
pub mod serialization;
pub mod trainer;

pub use dataset::{InMemoryDataset, SurveyTable};
pub use error::{DataInsufficiency, FedError, TrainingError};
pub use federated::{
    simulate, Coordinator, FederatedConfig, FederationResult, GlobalModel, MetricsLog, SimulationConfig,
    SimulationOutcome,
};
pub use model::{Fitted, LogisticModel, LogisticRegression, ModelParameters, Unfitted};
