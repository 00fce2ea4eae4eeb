//! Post-training evaluation of the final global model.

use crate::error::FedError;
use crate::federated::coordinator::GlobalModel;
use crate::federated::partition::{ClientDataset, GlobalHoldout};
use crate::metrics::{self, CalibrationCurve, ClassificationReport};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Bins of the holdout calibration curve.
pub const CALIBRATION_BINS: usize = 10;

/// Scores of the global model on one labelled set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub auc: Option<f64>,
    pub report: ClassificationReport,
}

impl Evaluation {
    fn of(model: &GlobalModel, x: &Array2<f64>, y: &Array1<f64>) -> Self {
        let classifier = model.classifier();
        let labels = classifier.predict_labels(x);
        Self {
            accuracy: metrics::accuracy(y, &labels),
            auc: metrics::roc_auc_score(y, &classifier.predict_proba(x)),
            report: metrics::classification_report(y, &labels),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientEvaluation {
    pub client_id: String,
    pub evaluation: Evaluation,
}

/// The global model scored on every client's test split and on the holdout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub clients: Vec<ClientEvaluation>,
    pub holdout: Evaluation,
    pub calibration: CalibrationCurve,
}

impl FinalReport {
    pub fn evaluate(model: &GlobalModel, clients: &[ClientDataset], holdout: &GlobalHoldout) -> Self {
        let clients = clients
            .iter()
            .map(|c| ClientEvaluation {
                client_id: c.id().to_string(),
                evaluation: Evaluation::of(model, c.test().features(), c.test().targets()),
            })
            .collect();
        let proba = model.classifier().predict_proba(holdout.features());
        Self {
            clients,
            holdout: Evaluation::of(model, holdout.features(), holdout.labels()),
            calibration: metrics::calibration_curve(holdout.labels(), &proba, CALIBRATION_BINS),
        }
    }

    pub fn to_json(&self) -> Result<String, FedError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), FedError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn fmt_auc(auc: Option<f64>) -> String {
    auc.map_or_else(|| "n/a".to_string(), |a| format!("{:.4}", a))
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.clients {
            writeln!(f, "Client {} accuracy: {:.4}", c.client_id, c.evaluation.accuracy)?;
            writeln!(f, "Client {} ROC AUC: {}", c.client_id, fmt_auc(c.evaluation.auc))?;
            writeln!(f, "{}", c.evaluation.report)?;
        }
        writeln!(f, "Global test set accuracy: {:.4}", self.holdout.accuracy)?;
        writeln!(f, "Global test set ROC AUC: {}", fmt_auc(self.holdout.auc))?;
        write!(f, "{}", self.holdout.report)
    }
}
