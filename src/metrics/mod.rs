//! Binary classification metrics.
//!
//! Labels and hard predictions are `0.0` / `1.0`; scores are positive-class
//! probabilities (or any monotone score for the ROC functions).

pub mod report;
pub mod roc;

pub use report::{classification_report, ClassMetrics, ClassificationReport};
pub use roc::{auc, calibration_curve, roc_auc_score, roc_curve, CalibrationCurve, RocCurve};

use ndarray::Array1;

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logarithms.
pub const LOG_LOSS_EPS: f64 = 1e-15;

/// Fraction of positions where `y_pred` equals `y_true`. Empty input gives 0.
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    hits as f64 / y_true.len() as f64
}

/// Mean binary cross-entropy of positive-class probabilities.
pub fn log_loss(y_true: &Array1<f64>, proba: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let total: f64 = y_true
        .iter()
        .zip(proba.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    total / y_true.len() as f64
}
