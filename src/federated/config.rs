//! Simulation settings.
//!
//! Every struct deserializes with missing fields taking their defaults, so a
//! JSON file only needs to name what it changes.

use crate::error::FedError;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn check(cond: bool, msg: impl FnOnce() -> String) -> Result<(), FedError> {
    if cond {
        Ok(())
    } else {
        Err(FedError::InvalidParameter(msg()))
    }
}

/// How the raw table is cut into clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Groups with fewer rows are dropped.
    pub min_client_rows: usize,
    /// Fraction of each group held out as the client's test split.
    pub test_size: f64,
    /// Seed of the per-group split and oversampling.
    pub seed: u64,
    /// Upper bound on the oversampler's neighbour count.
    pub max_k_neighbors: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            min_client_rows: 10,
            test_size: 0.2,
            seed: 42,
            max_k_neighbors: 5,
        }
    }
}

impl PartitionConfig {
    pub fn with_min_client_rows(mut self, rows: usize) -> Self {
        self.min_client_rows = rows;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_k_neighbors(mut self, k: usize) -> Self {
        self.max_k_neighbors = k;
        self
    }

    pub fn validate(&self) -> Result<(), FedError> {
        check(self.test_size > 0.0 && self.test_size < 1.0, || {
            format!("test_size must be in (0, 1), got {}", self.test_size)
        })?;
        check(self.max_k_neighbors > 0, || "max_k_neighbors must be positive".into())
    }
}

/// Hyperparameters of each client's logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTrainingConfig {
    /// Inverse L2 strength `C`; smaller means stronger regularization.
    pub inverse_regularization: f64,
    pub learning_rate: f64,
    pub max_epochs: usize,
    /// Gradient max-norm below which training stops early.
    pub tolerance: f64,
    /// `None` for full-batch gradient descent.
    pub batch_size: Option<usize>,
    pub seed: u64,
}

impl Default for LocalTrainingConfig {
    fn default() -> Self {
        Self {
            inverse_regularization: 1.0,
            learning_rate: 0.5,
            max_epochs: 100_000,
            tolerance: 1e-4,
            batch_size: None,
            seed: 42,
        }
    }
}

impl LocalTrainingConfig {
    pub fn with_inverse_regularization(mut self, c: f64) -> Self {
        self.inverse_regularization = c;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), FedError> {
        check(
            self.inverse_regularization > 0.0 && self.inverse_regularization.is_finite(),
            || format!("inverse_regularization must be positive, got {}", self.inverse_regularization),
        )?;
        check(
            self.learning_rate > 0.0 && self.learning_rate.is_finite(),
            || format!("learning_rate must be positive, got {}", self.learning_rate),
        )?;
        check(self.max_epochs > 0, || "max_epochs must be positive".into())?;
        check(self.tolerance >= 0.0, || {
            format!("tolerance must be non-negative, got {}", self.tolerance)
        })?;
        check(self.batch_size != Some(0), || "batch_size must be positive".into())
    }
}

/// Round structure of the federation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederatedConfig {
    pub num_rounds: usize,
    /// Standard deviation of the Gaussian noise added to every shared parameter.
    pub noise_scale: f64,
    /// Chance that a client takes part in a given round.
    pub participation_probability: f64,
    /// Train a round's clients on the rayon pool (needs the `parallel` feature).
    pub parallel_clients: bool,
}

impl Default for FederatedConfig {
    fn default() -> Self {
        Self {
            num_rounds: 10,
            noise_scale: 0.01,
            participation_probability: 0.8,
            parallel_clients: false,
        }
    }
}

impl FederatedConfig {
    pub fn with_num_rounds(mut self, rounds: usize) -> Self {
        self.num_rounds = rounds;
        self
    }

    pub fn with_noise_scale(mut self, sigma: f64) -> Self {
        self.noise_scale = sigma;
        self
    }

    pub fn with_participation_probability(mut self, p: f64) -> Self {
        self.participation_probability = p;
        self
    }

    pub fn with_parallel_clients(mut self, parallel: bool) -> Self {
        self.parallel_clients = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), FedError> {
        check(self.num_rounds > 0, || "num_rounds must be positive".into())?;
        check(self.noise_scale >= 0.0 && self.noise_scale.is_finite(), || {
            format!("noise_scale must be non-negative, got {}", self.noise_scale)
        })?;
        check(
            (0.0..=1.0).contains(&self.participation_probability),
            || {
                format!(
                    "participation_probability must be in [0, 1], got {}",
                    self.participation_probability
                )
            },
        )
    }
}

/// Everything `simulate` needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub partition: PartitionConfig,
    pub local: LocalTrainingConfig,
    pub federated: FederatedConfig,
    /// Fraction of the whole table held out for global evaluation.
    pub holdout_test_size: f64,
    /// Seed of the holdout split and of the coordinator's random source.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            partition: PartitionConfig::default(),
            local: LocalTrainingConfig::default(),
            federated: FederatedConfig::default(),
            holdout_test_size: 0.2,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn with_partition(mut self, partition: PartitionConfig) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_local(mut self, local: LocalTrainingConfig) -> Self {
        self.local = local;
        self
    }

    pub fn with_federated(mut self, federated: FederatedConfig) -> Self {
        self.federated = federated;
        self
    }

    pub fn with_holdout_test_size(mut self, test_size: f64) -> Self {
        self.holdout_test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), FedError> {
        self.partition.validate()?;
        self.local.validate()?;
        self.federated.validate()?;
        check(
            self.holdout_test_size > 0.0 && self.holdout_test_size < 1.0,
            || format!("holdout_test_size must be in (0, 1), got {}", self.holdout_test_size),
        )
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, FedError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FedError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, FedError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
