use ndarray::Array1;

/// A trait for differentiable loss functions used during model training.
///
/// Implementors must define:
/// - How to compute the scalar loss value (for logging/metrics).
/// - How to compute the gradient of the loss w.r.t. the model's predictions.
///
/// This gradient is passed to the model's `backward()` method to update parameters.
pub trait Loss {
    type Prediction;
    type Target;

    /// Computes the scalar loss value (for logging/metrics).
    fn loss(&self, prediction: &Self::Prediction, target: &Self::Target) -> f64;

    /// Computes the gradient of the loss w.r.t. the prediction: ∂L/∂pred.
    fn grad_wrt_prediction(
        &self,
        prediction: &Self::Prediction,
        target: &Self::Target,
    ) -> Self::Prediction;
}

/// Binary Cross-Entropy loss with logits input (numerically stable).
///
/// Computes the mean of `max(z, 0) - z * t + log(1 + exp(-|z|))`, which equals
/// `-(t * log(σ(z)) + (1 - t) * log(1 - σ(z)))` without overflow.
///
/// Gradient w.r.t. logits: `∂L/∂z = (σ(z) - t) / n`
#[derive(Clone, Copy, Debug, Default)]
pub struct BCEWithLogitsLoss;

impl Loss for BCEWithLogitsLoss {
    type Prediction = Array1<f64>;
    type Target = Array1<f64>;

    fn loss(&self, logits: &Self::Prediction, targets: &Self::Target) -> f64 {
        if logits.is_empty() {
            return 0.0;
        }
        let total: f64 = logits
            .iter()
            .zip(targets.iter())
            .map(|(&z, &t)| z.max(0.0) - z * t + (-z.abs()).exp().ln_1p())
            .sum();
        total / logits.len() as f64
    }

    fn grad_wrt_prediction(&self, logits: &Self::Prediction, targets: &Self::Target) -> Self::Prediction {
        let n = logits.len().max(1) as f64;
        (logits.mapv(crate::model::logistic::sigmoid) - targets) / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bce_with_logits_at_zero() {
        let logits = array![0.0, 0.0];
        let targets = array![1.0, 0.0];

        let bce = BCEWithLogitsLoss;
        // -log(0.5) for both samples
        let loss = bce.loss(&logits, &targets);
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);

        let grad = bce.grad_wrt_prediction(&logits, &targets);
        // (0.5 - 1) / 2, (0.5 - 0) / 2
        assert!((grad[0] + 0.25).abs() < 1e-12);
        assert!((grad[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_bce_with_logits_matches_naive_formula() {
        let logits = array![2.0, -1.5, 0.3];
        let targets = array![1.0, 0.0, 0.0];

        let naive: f64 = logits
            .iter()
            .zip(targets.iter())
            .map(|(&z, &t): (&f64, &f64)| {
                let p = 1.0 / (1.0 + (-z).exp());
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / 3.0;

        assert!((BCEWithLogitsLoss.loss(&logits, &targets) - naive).abs() < 1e-12);
    }

    #[test]
    fn test_bce_with_logits_is_stable_for_large_logits() {
        let logits = array![1000.0, -1000.0];
        let targets = array![0.0, 1.0];
        let loss = BCEWithLogitsLoss.loss(&logits, &targets);
        assert!(loss.is_finite());
        assert!((loss - 1000.0).abs() < 1e-9);
    }
}
