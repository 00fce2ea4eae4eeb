use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Receiver operating characteristic curve.
///
/// Points are ordered by decreasing threshold. The first point is `(0, 0)`
/// with an infinite threshold; every later point corresponds to one distinct
/// score value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Computes the ROC curve of `scores` against binary `y_true`.
///
/// Returns `None` when only one class is present, since one of the rates is
/// then undefined.
pub fn roc_curve(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<RocCurve> {
    let n_pos = y_true.iter().filter(|&&t| t == 1.0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == 1.0 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            curve.fpr.push(fp as f64 / n_neg as f64);
            curve.tpr.push(tp as f64 / n_pos as f64);
            curve.thresholds.push(scores[i]);
        }
    }
    Some(curve)
}

/// Trapezoidal area under the piecewise-linear curve through `(x, y)`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Area under the ROC curve, or `None` for a single-class `y_true`.
pub fn roc_auc_score(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    roc_curve(y_true, scores).map(|c| auc(&c.fpr, &c.tpr))
}

/// Reliability diagram data: observed positive fraction against mean
/// predicted probability, per probability bin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub prob_true: Vec<f64>,
    pub prob_pred: Vec<f64>,
}

/// Bins `proba` into `n_bins` uniform bins over `[0, 1]` and reports, for every
/// non-empty bin in increasing order, the positive rate and mean probability.
///
/// Bins are closed on the right: a probability equal to an inner edge
/// belongs to the lower bin.
pub fn calibration_curve(y_true: &Array1<f64>, proba: &Array1<f64>, n_bins: usize) -> CalibrationCurve {
    let n_bins = n_bins.max(1);
    let step = 1.0 / n_bins as f64;
    let inner_edges: Vec<f64> = (1..n_bins).map(|i| i as f64 * step).collect();
    let mut sums = vec![(0.0_f64, 0.0_f64, 0usize); n_bins];
    for (&t, &p) in y_true.iter().zip(proba.iter()) {
        let bin = inner_edges.partition_point(|&edge| edge < p);
        let entry = &mut sums[bin];
        entry.0 += t;
        entry.1 += p;
        entry.2 += 1;
    }

    let mut curve = CalibrationCurve {
        prob_true: Vec::new(),
        prob_pred: Vec::new(),
    };
    for (pos, pred, count) in sums.into_iter().filter(|s| s.2 > 0) {
        curve.prob_true.push(pos / count as f64);
        curve.prob_pred.push(pred / count as f64);
    }
    curve
}
