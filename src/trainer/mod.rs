//! Gradient-descent training loop shared by every client.

use crate::{
    dataset::Dataset,
    error::TrainingError,
    loss::Loss,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::marker::PhantomData;

/// Summary of a finished `fit` call.
#[derive(Clone, Debug, PartialEq)]
pub struct FitSummary {
    /// Epochs actually run (stops early on convergence).
    pub epochs: usize,
    /// Mean regularized loss of the last epoch.
    pub final_loss: f64,
    /// Whether the gradient fell below the tolerance before `max_epochs`.
    pub converged: bool,
}

pub struct Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub(crate) batch_size: Option<usize>,
    pub(crate) max_epochs: usize,
    pub(crate) tolerance: f64,
    pub(crate) shuffle: bool,
    pub(crate) seed: u64,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

pub struct TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    batch_size: Option<usize>,
    max_epochs: usize,
    tolerance: f64,
    shuffle: bool,
    seed: u64,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, P, R> TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: None,
            max_epochs: 1000,
            tolerance: 1e-4,
            shuffle: false,
            seed: 42,
            verbose: false,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    /// Mini-batch size. `None` trains on the full dataset every step.
    pub fn batch_size(mut self, size: Option<usize>) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Stop once the largest gradient component of an epoch is below `tol`.
    pub fn tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Visit mini-batches in a seeded random order each epoch.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Log every epoch at debug level instead of trace.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            tolerance: self.tolerance,
            shuffle: self.shuffle,
            seed: self.seed,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss<Target = Array1<f64>, Prediction = Array1<f64>>,
    M: TrainableModel<Input = Array2<f64>, Prediction = Array1<f64>, Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
    P: ParamOps,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, P, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    pub fn fit<D>(&self, model: M, dataset: &D) -> Result<M::Output, TrainingError>
    where
        D: Dataset,
    {
        self.fit_with_summary(model, dataset).map(|(fitted, _)| fitted)
    }

    /// Trains `model` on `dataset` and reports how the optimisation ended.
    pub fn fit_with_summary<D>(
        &self,
        mut model: M,
        dataset: &D,
    ) -> Result<(M::Output, FitSummary), TrainingError>
    where
        D: Dataset,
    {
        let n_total = dataset.len().unwrap_or(0);
        if n_total == 0 {
            return Err(TrainingError::EmptyData);
        }
        let batch_size = self.batch_size.unwrap_or(n_total).max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut summary = FitSummary {
            epochs: 0,
            final_loss: f64::NAN,
            converged: false,
        };

        for epoch in 0..self.max_epochs {
            let batches = if self.shuffle {
                dataset.shuffled_batches(batch_size, &mut rng)
            } else {
                dataset.batches(batch_size)
            };

            let mut total_loss = 0.0;
            let mut max_grad = 0.0_f64;
            for batch_result in batches {
                let (batch_x, batch_y) =
                    batch_result.map_err(|e| TrainingError::DataAccess(format!("{:?}", e)))?;

                let preds = model.forward(&batch_x);
                let (reg_penalty, reg_grad) = self.regularizer.regularizer_penalty_grad(&model);
                let batch_loss = self.loss_fn.loss(&preds, &batch_y) + reg_penalty;
                total_loss += batch_loss * batch_y.len() as f64;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let total_grads = model.backward(&batch_x, &grad_preds).add(&reg_grad);
                max_grad = max_grad.max(total_grads.max_abs());

                let new_params = self.optimizer.step(model.params(), &total_grads);
                model.update_params(&new_params);
            }

            let avg_loss = total_loss / n_total as f64;
            if !avg_loss.is_finite() || !max_grad.is_finite() {
                log::warn!("training diverged at epoch {}", epoch);
                return Err(TrainingError::Diverged { epoch });
            }
            let level = if self.verbose {
                log::Level::Debug
            } else {
                log::Level::Trace
            };
            log::log!(level, "epoch {}: loss = {:.6}, max |grad| = {:.3e}", epoch, avg_loss, max_grad);

            summary.epochs = epoch + 1;
            summary.final_loss = avg_loss;
            if max_grad < self.tolerance {
                summary.converged = true;
                break;
            }
        }

        log::debug!(
            "fit finished after {} epoch(s), loss = {:.6}, converged = {}",
            summary.epochs,
            summary.final_loss,
            summary.converged
        );
        Ok((model.into_fitted(), summary))
    }
}
