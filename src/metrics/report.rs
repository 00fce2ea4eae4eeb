use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 of one class (or an average over classes).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class scores for labels `0` and `1` plus their averages.
///
/// Ratios with a zero denominator are reported as 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn class_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>, label: f64) -> ClassMetrics {
    let (mut tp, mut predicted, mut support) = (0, 0, 0);
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if p == label {
            predicted += 1;
        }
        if t == label {
            support += 1;
            if p == label {
                tp += 1;
            }
        }
    }
    let precision = ratio(tp, predicted);
    let recall = ratio(tp, support);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

fn average(classes: &[ClassMetrics; 2], weights: [f64; 2]) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let avg = |f: fn(&ClassMetrics) -> f64| {
        if norm == 0.0 {
            0.0
        } else {
            classes.iter().zip(weights).map(|(c, w)| f(c) * w).sum::<f64>() / norm
        }
    };
    ClassMetrics {
        precision: avg(|c| c.precision),
        recall: avg(|c| c.recall),
        f1: avg(|c| c.f1),
        support: classes.iter().map(|c| c.support).sum(),
    }
}

pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> ClassificationReport {
    let classes = [
        class_metrics(y_true, y_pred, 0.0),
        class_metrics(y_true, y_pred, 1.0),
    ];

    let macro_avg = average(&classes, [1.0, 1.0]);
    let weighted_avg = average(&classes, [classes[0].support as f64, classes[1].support as f64]);

    ClassificationReport {
        accuracy: super::accuracy(y_true, y_pred),
        classes,
        macro_avg,
        weighted_avg,
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        write_row(f, "0", &self.classes[0])?;
        write_row(f, "1", &self.classes[1])?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_report_values() {
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0];
        let p = array![0.0, 0.0, 1.0, 1.0, 0.0];
        let r = classification_report(&y, &p);

        // class 0: tp 2, predicted 3, support 3
        assert!((r.classes[0].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.classes[0].recall - 2.0 / 3.0).abs() < 1e-12);
        // class 1: tp 1, predicted 2, support 2
        assert!((r.classes[1].precision - 0.5).abs() < 1e-12);
        assert!((r.classes[1].recall - 0.5).abs() < 1e-12);
        assert_eq!(r.accuracy, 0.6);

        let expected_macro = (2.0 / 3.0 + 0.5) / 2.0;
        assert!((r.macro_avg.f1 - expected_macro).abs() < 1e-12);
        let expected_weighted = (2.0 / 3.0 * 3.0 + 0.5 * 2.0) / 5.0;
        assert!((r.weighted_avg.f1 - expected_weighted).abs() < 1e-12);
        assert_eq!(r.weighted_avg.support, 5);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let y = array![0.0, 1.0];
        let p = array![0.0, 0.0];
        let r = classification_report(&y, &p);
        assert_eq!(r.classes[1].precision, 0.0);
        assert_eq!(r.classes[1].f1, 0.0);
        assert!(r.to_string().contains("weighted avg"));
    }
}
