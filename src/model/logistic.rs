//! Binary logistic regression with compile-time state tracking.
//!
//! - [`LogisticRegression`] = `LogisticModel<Unfitted>`, used during training.
//! - `LogisticModel<Fitted>`: inference-only, serializable predictor.
//!
//! The model outputs logits `z = w^T x + b` during training; the fitted
//! model exposes `P(y = 1 | x) = sigmoid(z)` and hard labels at the 0.5
//! probability threshold.

use crate::error::FedError;
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Coefficient vector and intercept of a linear decision boundary.
///
/// This is the only thing that crosses a client boundary in the federation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl ModelParameters {
    pub fn new(coefficients: Array1<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// All-zero parameters for `n_features` features.
    pub fn zeros(n_features: usize) -> Self {
        Self::new(Array1::zeros(n_features), 0.0)
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Logits `X w + b` for every row of `x`.
    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    pub fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.coefficients.iter().all(|c| c.is_finite())
    }
}

impl ParamOps for ModelParameters {
    fn add(&self, other: &Self) -> Self {
        Self {
            coefficients: &self.coefficients + &other.coefficients,
            intercept: self.intercept + other.intercept,
        }
    }

    fn scale(&self, scalar: f64) -> Self {
        Self {
            coefficients: &self.coefficients * scalar,
            intercept: self.intercept * scalar,
        }
    }

    fn max_abs(&self) -> f64 {
        self.coefficients
            .iter()
            .fold(self.intercept.abs(), |m, c| m.max(c.abs()))
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// A logistic model with state encoded at the type level.
///
/// You cannot call `predict()` on an untrained model: only
/// `LogisticModel<Fitted>` implements [`InferenceModel`].
#[derive(Clone, Debug)]
pub struct LogisticModel<S> {
    params: ModelParameters,
    _state: PhantomData<S>,
}

/// Alias for an **unfitted** logistic regression model.
pub type LogisticRegression = LogisticModel<Unfitted>;

impl LogisticModel<Unfitted> {
    /// Creates a model with zero-initialized weights.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(ModelParameters::zeros(n_features))
    }

    /// Constructs a model from explicit parameters (warm start).
    pub fn from_params(params: ModelParameters) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

impl LogisticModel<Fitted> {
    /// Wraps trained (or aggregated) parameters for inference.
    pub fn new(params: ModelParameters) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn into_params(self) -> ModelParameters {
        self.params
    }

    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        self.params.decision_function(x)
    }

    /// Positive-class probability for every row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }

    /// Hard `0.0` / `1.0` labels: positive when the probability exceeds 0.5.
    pub fn predict_labels(&self, x: &Array2<f64>) -> Array1<f64> {
        self.predict_proba(x)
            .mapv(|p| if p > 0.5 { 1.0 } else { 0.0 })
    }
}

impl InferenceModel for LogisticModel<Fitted> {
    type InputSingle = Array1<f64>;
    type OutputSingle = f64;
    type InputBatch = Array2<f64>;
    type OutputBatch = Array1<f64>;
    type ParamsRepr = ModelParameters;

    /// Positive-class probability of a single feature vector.
    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle {
        sigmoid(self.params.coefficients.dot(input) + self.params.intercept)
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch {
        self.predict_proba(input)
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        self.params.clone()
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self, FedError> {
        if !params.is_finite() {
            return Err(FedError::InvalidParameter(
                "model parameters contain NaN or infinite values".into(),
            ));
        }
        Ok(Self::new(params))
    }
}

/// Forward pass: `X @ w + b` (logits).
/// Backward pass: `∇w = X^T · grad`, `∇b = sum(grad)`.
impl TrainableModel for LogisticModel<Unfitted> {
    type Input = Array2<f64>;
    type Prediction = Array1<f64>;
    type Params = ModelParameters;
    type Gradients = ModelParameters;
    type Output = LogisticModel<Fitted>;

    fn forward(&self, x: &Self::Input) -> Self::Prediction {
        self.params.decision_function(x)
    }

    fn backward(&self, x: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients {
        ModelParameters {
            coefficients: x.t().dot(grad_output),
            intercept: grad_output.sum(),
        }
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, params: &Self::Params) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LogisticModel<Fitted> {
        LogisticModel::<Fitted>::new(self.params)
    }
}
