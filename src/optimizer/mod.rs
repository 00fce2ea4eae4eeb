use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// Training logic (`Trainer`) is decoupled from the parameter update rule,
/// so any model can be paired with any optimizer without dynamic dispatch.
pub trait Optimizer<P> {
    /// Returns `params - learning_rate * gradients` (or the optimizer's own
    /// rule). Inputs are not mutated.
    fn step(&self, params: &P, gradients: &P) -> P;
}

/// Plain gradient descent: `θ ← θ - η · ∇L(θ)`.
///
/// Stateless. With full-batch training this is ordinary batch gradient descent.
#[derive(Clone, Copy, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&self, params: &P, grads: &P) -> P {
        params.add(&grads.scale(-self.lr))
    }
}
