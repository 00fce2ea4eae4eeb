//! Round-indexed metrics, appended once per round and never rewritten.
//!
//! The queries on [`MetricsLog`] produce the series external plotting code
//! draws: global accuracy and AUC per round, per-client participation and
//! accuracy, and each client's weighted contribution.

use crate::error::FedError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened to one client in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationStatus {
    /// Trained and sent an update.
    Trained,
    /// Not selected this round.
    Skipped,
    /// Selected but could not train (single-class labels or divergence).
    Degenerate,
}

impl ParticipationStatus {
    /// The 0/1 participation flag: 1 only when an update was sent.
    pub fn flag(self) -> u8 {
        match self {
            ParticipationStatus::Trained => 1,
            ParticipationStatus::Skipped | ParticipationStatus::Degenerate => 0,
        }
    }
}

/// One client's record for one round. Metric fields are `None` (a gap)
/// unless the client trained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientRoundMetrics {
    pub client_id: String,
    pub status: ParticipationStatus,
    pub training_size: usize,
    pub training_loss: Option<f64>,
    pub test_accuracy: Option<f64>,
    pub test_auc: Option<f64>,
}

impl ClientRoundMetrics {
    pub fn gap(client_id: impl Into<String>, status: ParticipationStatus, training_size: usize) -> Self {
        Self {
            client_id: client_id.into(),
            status,
            training_size,
            training_loss: None,
            test_accuracy: None,
            test_auc: None,
        }
    }

    pub fn participated(&self) -> bool {
        self.status == ParticipationStatus::Trained
    }
}

/// All metrics of one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    /// Zero-based round index.
    pub round: usize,
    /// One entry per client, in client order.
    pub clients: Vec<ClientRoundMetrics>,
    /// Accuracy of the global model on the holdout after this round.
    pub global_accuracy: f64,
    /// ROC-AUC of the global model on the holdout; `None` for a single-class holdout.
    pub global_auc: Option<f64>,
}

impl RoundMetrics {
    pub fn participants(&self) -> usize {
        self.clients.iter().filter(|c| c.participated()).count()
    }
}

/// Append-only log of every round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsLog {
    rounds: Vec<RoundMetrics>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: RoundMetrics) {
        self.rounds.push(round);
    }

    pub fn rounds(&self) -> &[RoundMetrics] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn n_clients(&self) -> usize {
        self.rounds.first().map_or(0, |r| r.clients.len())
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.rounds
            .first()
            .map(|r| r.clients.iter().map(|c| c.client_id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn global_accuracies(&self) -> Vec<f64> {
        self.rounds.iter().map(|r| r.global_accuracy).collect()
    }

    pub fn global_aucs(&self) -> Vec<Option<f64>> {
        self.rounds.iter().map(|r| r.global_auc).collect()
    }

    /// Clients × rounds matrix of 0/1 participation flags.
    pub fn participation_matrix(&self) -> Vec<Vec<u8>> {
        (0..self.n_clients())
            .map(|c| self.rounds.iter().map(|r| r.clients[c].status.flag()).collect())
            .collect()
    }

    /// Rounds in which each client sent an update.
    pub fn participation_counts(&self) -> Vec<usize> {
        (0..self.n_clients())
            .map(|c| self.rounds.iter().filter(|r| r.clients[c].participated()).count())
            .collect()
    }

    /// Mean local test accuracy per client over the rounds it trained in;
    /// `None` for a client that never trained.
    pub fn mean_local_accuracies(&self) -> Vec<Option<f64>> {
        (0..self.n_clients())
            .map(|c| {
                let values: Vec<f64> = self
                    .rounds
                    .iter()
                    .filter_map(|r| r.clients[c].test_accuracy)
                    .collect();
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            })
            .collect()
    }

    /// Clients × rounds local accuracy, gaps filled with 0.
    pub fn accuracy_matrix(&self) -> Vec<Vec<f64>> {
        (0..self.n_clients())
            .map(|c| {
                self.rounds
                    .iter()
                    .map(|r| r.clients[c].test_accuracy.unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }

    /// Per-client `training_size × participation_count`.
    pub fn contributions(&self) -> Vec<(String, usize)> {
        let Some(first) = self.rounds.first() else {
            return Vec::new();
        };
        first
            .clients
            .iter()
            .zip(self.participation_counts())
            .map(|(c, count)| (c.client_id.clone(), c.training_size * count))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, FedError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), FedError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, FedError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
