//! Turns a group-keyed survey table into federated clients.
//!
//! For every group, in first-appearance order:
//! 1. groups with fewer than `min_client_rows` rows are dropped;
//! 2. the rows are split into train and test parts (seeded);
//! 3. the training part is oversampled with SMOTE until both classes have
//!    the same count, with `k = min(max_k_neighbors, n_minority - 1)`;
//! 4. a standard scaler is fit on the resampled training part and applied
//!    to both parts.
//!
//! A group that fails any step is excluded. Exclusion is normal operation:
//! the reason is kept in [`PartitionOutcome::dropped`] and the coordinator
//! only ever sees the surviving clients.

use crate::dataset::{train_test_split, InMemoryDataset, SurveyTable};
use crate::error::{DataInsufficiency, FedError};
use crate::federated::config::PartitionConfig;
use crate::preprocessing::{FittedTransformer, Resampler, Smote, StandardScaler, Transformer};
use ndarray::{Array1, Array2};

/// One federated participant: its scaled, class-balanced training split and
/// its scaled test split. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientDataset {
    id: String,
    train: InMemoryDataset,
    test: InMemoryDataset,
}

impl ClientDataset {
    pub fn new(
        id: impl Into<String>,
        train: InMemoryDataset,
        test: InMemoryDataset,
    ) -> Result<Self, FedError> {
        use crate::dataset::Dataset;
        if train.n_features() != test.n_features() {
            return Err(FedError::FeatureMismatch {
                expected_features: train.n_features(),
                got_features: test.n_features(),
            });
        }
        Ok(Self {
            id: id.into(),
            train,
            test,
        })
    }

    /// Group key the client was built from.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn train(&self) -> &InMemoryDataset {
        &self.train
    }

    pub fn test(&self) -> &InMemoryDataset {
        &self.test
    }

    /// Rows of the (resampled) training split; the client's aggregation weight.
    pub fn training_size(&self) -> usize {
        self.train.rows()
    }

    pub fn n_features(&self) -> usize {
        self.train.features().ncols()
    }
}

/// Surviving clients plus the reasons the other groups were excluded.
#[derive(Clone, Debug)]
pub struct PartitionOutcome {
    pub clients: Vec<ClientDataset>,
    pub dropped: Vec<DataInsufficiency>,
}

impl PartitionOutcome {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    pub fn client_ids(&self) -> Vec<&str> {
        self.clients.iter().map(ClientDataset::id).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Partitioner {
    config: PartitionConfig,
}

impl Partitioner {
    pub fn new(config: PartitionConfig) -> Result<Self, FedError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Builds one client per sufficiently large, resamplable group.
    pub fn partition(&self, table: &SurveyTable) -> PartitionOutcome {
        let mut outcome = PartitionOutcome {
            clients: Vec::new(),
            dropped: Vec::new(),
        };

        for (group, indices) in table.group_indices() {
            let (x, y) = table.select(&indices);
            match self.build_client(&group, &x, &y) {
                Ok(client) => {
                    log::debug!(
                        "client '{}': {} rows, {} training rows after resampling",
                        group,
                        indices.len(),
                        client.training_size()
                    );
                    outcome.clients.push(client);
                }
                Err(reason) => {
                    log::debug!("dropping group: {}", reason);
                    outcome.dropped.push(reason);
                }
            }
        }

        log::info!(
            "partitioned {} rows into {} client(s), {} group(s) dropped",
            table.n_rows(),
            outcome.clients.len(),
            outcome.dropped.len()
        );
        outcome
    }

    fn build_client(
        &self,
        group: &str,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<ClientDataset, DataInsufficiency> {
        let rows = x.nrows();
        if rows < self.config.min_client_rows {
            return Err(DataInsufficiency::TooFewRows {
                group: group.to_string(),
                rows,
                min_rows: self.config.min_client_rows,
            });
        }

        let empty_split = || DataInsufficiency::EmptySplit {
            group: group.to_string(),
            rows,
        };
        let split = train_test_split(x, y, self.config.test_size, self.config.seed)
            .map_err(|_| empty_split())?;

        let n_pos = split.y_train.iter().filter(|&&t| t == 1.0).count();
        let n_minority = n_pos.min(split.y_train.len() - n_pos);
        let k = Smote::neighbors_for(n_minority, self.config.max_k_neighbors);
        let (x_res, y_res) = Smote::new(self.config.seed)
            .with_k_neighbors(k)
            .fit_resample(&split.x_train, &split.y_train)
            .map_err(|source| DataInsufficiency::ResamplingInfeasible {
                group: group.to_string(),
                source,
            })?;

        let scaled = StandardScaler::new().fit(&x_res).and_then(|scaler| {
            let train = InMemoryDataset::new(scaler.transform(&x_res)?, y_res)?;
            let test = InMemoryDataset::new(scaler.transform(&split.x_test)?, split.y_test)?;
            ClientDataset::new(group, train, test)
        });
        scaled.map_err(|_| empty_split())
    }
}

/// The fixed global evaluation set, already scaled.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalHoldout {
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl GlobalHoldout {
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self, FedError> {
        if features.nrows() != labels.len() {
            return Err(FedError::InvalidShape {
                expected: format!("{} labels", features.nrows()),
                got: format!("{} labels", labels.len()),
            });
        }
        if labels.is_empty() {
            return Err(FedError::EmptyData("holdout has no rows".into()));
        }
        Ok(Self { features, labels })
    }

    /// Holds out `test_size` of the whole table and standardizes it.
    ///
    /// The scaler is fit on the holdout rows themselves, not on training data.
    /// Global metrics therefore use the holdout's own statistics; this matches
    /// the reference results and is kept deliberately.
    pub fn from_table(table: &SurveyTable, test_size: f64, seed: u64) -> Result<Self, FedError> {
        let split = train_test_split(table.features(), table.labels(), test_size, seed)?;
        let scaled = StandardScaler::new().fit_transform(&split.x_test)?;
        log::info!("global holdout: {} rows", split.y_test.len());
        Self::new(scaled, split.y_test)
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}
