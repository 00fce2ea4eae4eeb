use crate::model::{LogisticRegression, ModelParameters, TrainableModel};

/// A penalty added to the data loss, returned together with its gradient.
pub trait Regularizer<M: TrainableModel> {
    fn regularizer_penalty_grad(&self, model: &M) -> (f64, M::Gradients);
}

/// Ridge penalty `λ‖w‖²` on the coefficients. The intercept is not penalised.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }

    /// Penalty strength matching an inverse regularization strength `c`
    /// on a data set of `n` rows under a mean data loss: `λ = 1 / (2·c·n)`.
    ///
    /// Unlike liblinear, which penalizes the intercept through
    /// `intercept_scaling`, the intercept here stays unpenalized.
    pub fn from_inverse_strength(c: f64, n: usize) -> Self {
        Self::new(1.0 / (2.0 * c * n.max(1) as f64))
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Regularizer<LogisticRegression> for L2 {
    fn regularizer_penalty_grad(&self, model: &LogisticRegression) -> (f64, ModelParameters) {
        let w = &model.params().coefficients;
        let penalty = self.lambda * w.dot(w);
        let grad = ModelParameters::new(w * (2.0 * self.lambda), 0.0);
        (penalty, grad)
    }
}

pub struct NoRegularizer;

impl Regularizer<LogisticRegression> for NoRegularizer {
    fn regularizer_penalty_grad(&self, model: &LogisticRegression) -> (f64, ModelParameters) {
        (0.0, ModelParameters::zeros(model.params().n_features()))
    }
}
