//! Federated averaging over country-partitioned survey data.
//!
//! Data flow:
//!
//! ```text
//! SurveyTable -> Partitioner -> [ClientDataset]
//!                                      |
//!              Coordinator, per round: LocalTrainer -> GaussianPerturbation
//!                                      |
//!                              federated_average -> GlobalModel -> holdout metrics
//! ```
//!
//! This is a simulation. Clients live in one process, nothing crosses a
//! network and the additive noise carries no formal privacy guarantee.

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod history;
pub mod local;
pub mod partition;
pub mod privacy;
pub mod report;

#[cfg(test)]
mod tests;

pub use aggregate::{federated_average, ClientUpdate};
pub use config::{FederatedConfig, LocalTrainingConfig, PartitionConfig, SimulationConfig};
pub use coordinator::{Coordinator, FederationResult, GlobalModel};
pub use history::{ClientRoundMetrics, MetricsLog, ParticipationStatus, RoundMetrics};
pub use local::{LocalOutcome, LocalTrainer};
pub use partition::{ClientDataset, GlobalHoldout, PartitionOutcome, Partitioner};
pub use privacy::GaussianPerturbation;
pub use report::{ClientEvaluation, Evaluation, FinalReport};

use crate::dataset::SurveyTable;
use crate::error::FedError;

/// Everything a full simulation produces.
#[derive(Clone, Debug)]
pub struct SimulationOutcome {
    pub partition: PartitionOutcome,
    pub result: FederationResult,
    pub report: FinalReport,
}

/// Partitions `table`, prepares the global holdout, federates the surviving
/// clients and evaluates the final model.
///
/// # Errors
/// Fails fast on invalid configuration, on a table too small to hold out a
/// test set, and with `NoClients` when every group was dropped.
pub fn simulate(table: &SurveyTable, config: &SimulationConfig) -> Result<SimulationOutcome, FedError> {
    config.validate()?;
    let partition = Partitioner::new(config.partition.clone())?.partition(table);
    let holdout = GlobalHoldout::from_table(table, config.holdout_test_size, config.seed)?;

    let coordinator = Coordinator::new(config.federated.clone(), config.local.clone())?;
    let result = coordinator.run_seeded(&partition.clients, &holdout, config.seed)?;
    let report = FinalReport::evaluate(&result.model, &partition.clients, &holdout);

    Ok(SimulationOutcome {
        partition,
        result,
        report,
    })
}
