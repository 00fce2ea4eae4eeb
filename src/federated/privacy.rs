//! Additive Gaussian noise on shared parameters.
//!
//! Each coefficient and the intercept receive independent `N(0, σ²)` noise
//! before leaving the client. This blurs exact parameter values in the
//! aggregation step; no (ε, δ) privacy budget is computed or enforced, so it
//! is not a formal differential-privacy guarantee.

use crate::error::FedError;
use crate::model::ModelParameters;
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Copy, Debug)]
pub struct GaussianPerturbation {
    sigma: f64,
    normal: Normal<f64>,
}

impl GaussianPerturbation {
    /// # Errors
    /// `InvalidParameter` if `sigma` is negative or not finite.
    pub fn new(sigma: f64) -> Result<Self, FedError> {
        if !(sigma >= 0.0 && sigma.is_finite()) {
            return Err(FedError::InvalidParameter(format!(
                "noise scale must be finite and non-negative, got {}",
                sigma
            )));
        }
        let normal = Normal::new(0.0, sigma).map_err(|e| FedError::InvalidParameter(e.to_string()))?;
        Ok(Self { sigma, normal })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Returns a noised copy of `params`. Coefficients are drawn first, in
    /// order, then the intercept. With `σ = 0` the copy is exact and `rng`
    /// is not touched.
    pub fn perturb<R: Rng + ?Sized>(&self, params: &ModelParameters, rng: &mut R) -> ModelParameters {
        if self.sigma == 0.0 {
            return params.clone();
        }
        let coefficients = params.coefficients.mapv(|w| w + self.normal.sample(rng));
        let intercept = params.intercept + self.normal.sample(rng);
        ModelParameters::new(coefficients, intercept)
    }
}
