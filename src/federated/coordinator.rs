//! The round loop of federated averaging.
//!
//! A round is a pure transition `(round index, GlobalModel) -> (GlobalModel,
//! RoundMetrics)` driven by an injected random source:
//!
//! 1. one uniform draw per client, in client order, decides participation;
//! 2. one noise seed is drawn per participant, in client order;
//! 3. every participant trains a fresh local model and perturbs it with a
//!    generator seeded from its own noise seed;
//! 4. the updates are averaged into the new global model, or the model is
//!    kept unchanged when nobody trained;
//! 5. the global model is evaluated on the holdout.
//!
//! All draws happen before any training, so the results do not depend on
//! whether clients are trained sequentially or on the rayon pool, and a round
//! consumes the random source the same way whatever the total round count.

use crate::error::{FedError, TrainingError};
use crate::federated::aggregate::{federated_average, ClientUpdate};
use crate::federated::config::{FederatedConfig, LocalTrainingConfig};
use crate::federated::history::{ClientRoundMetrics, MetricsLog, ParticipationStatus, RoundMetrics};
use crate::federated::local::{LocalOutcome, LocalTrainer};
use crate::federated::partition::{ClientDataset, GlobalHoldout};
use crate::federated::privacy::GaussianPerturbation;
use crate::metrics;
use crate::model::{Fitted, LogisticModel, ModelParameters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The parameters carried from round to round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalModel {
    params: ModelParameters,
}

impl GlobalModel {
    /// The starting point of round 0: zero coefficients and intercept.
    pub fn zeros(n_features: usize) -> Self {
        Self::from_params(ModelParameters::zeros(n_features))
    }

    pub fn from_params(params: ModelParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn into_params(self) -> ModelParameters {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.params.n_features()
    }

    /// A fitted classifier with the global parameters.
    pub fn classifier(&self) -> LogisticModel<Fitted> {
        LogisticModel::<Fitted>::new(self.params.clone())
    }

    /// Accuracy and ROC-AUC on the holdout.
    pub fn evaluate(&self, holdout: &GlobalHoldout) -> (f64, Option<f64>) {
        let model = self.classifier();
        let accuracy = metrics::accuracy(holdout.labels(), &model.predict_labels(holdout.features()));
        let auc = metrics::roc_auc_score(holdout.labels(), &model.predict_proba(holdout.features()));
        (accuracy, auc)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FedError> {
        crate::serialization::save_params(self, path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FedError> {
        crate::serialization::load_params(path)
    }
}

/// Final model and the full metrics log of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct FederationResult {
    pub model: GlobalModel,
    pub metrics: MetricsLog,
}

/// A participant's training result: the local outcome and the noised
/// parameters it shares.
type TrainedClient = (LocalOutcome, ModelParameters);
type JobResult = (usize, Result<TrainedClient, TrainingError>);

#[derive(Clone, Debug)]
pub struct Coordinator {
    config: FederatedConfig,
    trainer: LocalTrainer,
    perturbation: GaussianPerturbation,
}

impl Coordinator {
    pub fn new(config: FederatedConfig, local: LocalTrainingConfig) -> Result<Self, FedError> {
        config.validate()?;
        if config.parallel_clients && !cfg!(feature = "parallel") {
            log::warn!("parallel_clients is set but the `parallel` feature is disabled; training sequentially");
        }
        Ok(Self {
            perturbation: GaussianPerturbation::new(config.noise_scale)?,
            trainer: LocalTrainer::new(local)?,
            config,
        })
    }

    pub fn config(&self) -> &FederatedConfig {
        &self.config
    }

    /// Runs `num_rounds` rounds from the zero model, seeding the random source with `seed`.
    pub fn run_seeded(
        &self,
        clients: &[ClientDataset],
        holdout: &GlobalHoldout,
        seed: u64,
    ) -> Result<FederationResult, FedError> {
        self.run(clients, holdout, &mut StdRng::seed_from_u64(seed))
    }

    /// Runs `num_rounds` rounds from the zero model.
    ///
    /// # Errors
    /// - `NoClients` when `clients` is empty
    /// - `FeatureMismatch` when client or holdout widths disagree
    pub fn run<R: Rng>(
        &self,
        clients: &[ClientDataset],
        holdout: &GlobalHoldout,
        rng: &mut R,
    ) -> Result<FederationResult, FedError> {
        let n_features = validate_inputs(clients, holdout)?;
        log::info!(
            "federating {} client(s) for {} round(s), noise {}, participation {}",
            clients.len(),
            self.config.num_rounds,
            self.config.noise_scale,
            self.config.participation_probability
        );

        let mut model = GlobalModel::zeros(n_features);
        let mut log = MetricsLog::new();
        for round_idx in 0..self.config.num_rounds {
            let (next, metrics) = self.round(round_idx, model, clients, holdout, rng)?;
            model = next;
            log.push(metrics);
        }
        Ok(FederationResult { model, metrics: log })
    }

    /// One round transition. `model` is returned unchanged when no client trains.
    pub fn round<R: Rng>(
        &self,
        round_idx: usize,
        model: GlobalModel,
        clients: &[ClientDataset],
        holdout: &GlobalHoldout,
        rng: &mut R,
    ) -> Result<(GlobalModel, RoundMetrics), FedError> {
        let p = self.config.participation_probability;
        let selected: Vec<bool> = clients.iter().map(|_| rng.random::<f64>() < p).collect();
        let jobs: Vec<(usize, u64)> = selected
            .iter()
            .enumerate()
            .filter(|(_, &s)| s)
            .map(|(i, _)| (i, rng.random::<u64>()))
            .collect();

        let results = self.train_participants(&jobs, clients);

        let mut records: Vec<ClientRoundMetrics> = clients
            .iter()
            .map(|c| ClientRoundMetrics::gap(c.id(), ParticipationStatus::Skipped, c.training_size()))
            .collect();
        let mut updates = Vec::with_capacity(results.len());
        for (i, result) in results {
            let client = &clients[i];
            match result {
                Ok((outcome, noised)) => {
                    let record = &mut records[i];
                    record.status = ParticipationStatus::Trained;
                    record.training_loss = Some(outcome.training_loss);
                    record.test_accuracy = Some(outcome.test_accuracy);
                    record.test_auc = outcome.test_auc;
                    updates.push(ClientUpdate {
                        client_index: i,
                        params: noised,
                        training_size: outcome.training_size,
                    });
                }
                Err(err) => {
                    log::warn!("round {}: client '{}' did not train: {}", round_idx, client.id(), err);
                    records[i].status = ParticipationStatus::Degenerate;
                }
            }
        }

        let model = if updates.is_empty() {
            log::warn!("round {}: no participants, global model unchanged", round_idx);
            model
        } else {
            GlobalModel::from_params(federated_average(&updates)?)
        };

        let (global_accuracy, global_auc) = model.evaluate(holdout);
        log::info!(
            "round {}: {}/{} participant(s), global accuracy {:.4}, auc {}",
            round_idx,
            updates.len(),
            clients.len(),
            global_accuracy,
            global_auc.map_or("n/a".to_string(), |a| format!("{:.4}", a))
        );

        let metrics = RoundMetrics {
            round: round_idx,
            clients: records,
            global_accuracy,
            global_auc,
        };
        Ok((model, metrics))
    }

    fn train_client(&self, client: &ClientDataset, noise_seed: u64) -> Result<TrainedClient, TrainingError> {
        let outcome = self.trainer.train(client)?;
        let mut rng = StdRng::seed_from_u64(noise_seed);
        let noised = self.perturbation.perturb(&outcome.params, &mut rng);
        Ok((outcome, noised))
    }

    /// Trains every `(client index, noise seed)` job; results keep job order.
    #[cfg(feature = "parallel")]
    fn train_participants(&self, jobs: &[(usize, u64)], clients: &[ClientDataset]) -> Vec<JobResult> {
        use rayon::prelude::*;
        if !self.config.parallel_clients {
            return self.train_sequential(jobs, clients);
        }
        jobs.par_iter()
            .map(|&(i, seed)| (i, self.train_client(&clients[i], seed)))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn train_participants(&self, jobs: &[(usize, u64)], clients: &[ClientDataset]) -> Vec<JobResult> {
        self.train_sequential(jobs, clients)
    }

    fn train_sequential(&self, jobs: &[(usize, u64)], clients: &[ClientDataset]) -> Vec<JobResult> {
        jobs.iter()
            .map(|&(i, seed)| (i, self.train_client(&clients[i], seed)))
            .collect()
    }
}

/// Checks that there is at least one client and that every client and the
/// holdout share one feature width, which is returned.
fn validate_inputs(clients: &[ClientDataset], holdout: &GlobalHoldout) -> Result<usize, FedError> {
    let first = clients.first().ok_or(FedError::NoClients)?;
    let n_features = first.n_features();
    if let Some(bad) = clients.iter().find(|c| c.n_features() != n_features) {
        return Err(FedError::FeatureMismatch {
            expected_features: n_features,
            got_features: bad.n_features(),
        });
    }
    if holdout.n_features() != n_features {
        return Err(FedError::FeatureMismatch {
            expected_features: n_features,
            got_features: holdout.n_features(),
        });
    }
    Ok(n_features)
}
