//! One client's local fit.

use crate::error::{FedError, TrainingError};
use crate::federated::config::LocalTrainingConfig;
use crate::federated::partition::ClientDataset;
use crate::loss::BCEWithLogitsLoss;
use crate::metrics;
use crate::model::{LogisticRegression, ModelParameters};
use crate::optimizer::SGD;
use crate::regularizers::L2;
use crate::trainer::Trainer;
use ndarray::Array2;

/// What a client reports after fitting its local model.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalOutcome {
    /// Trained, not yet perturbed, parameters.
    pub params: ModelParameters,
    /// Log-loss on the training rows the model was fit on. This is an
    /// in-sample figure, not a generalization estimate.
    pub training_loss: f64,
    /// Accuracy on the client's test split at the 0.5 probability threshold.
    pub test_accuracy: f64,
    /// ROC-AUC on the test split; `None` when the split holds one class.
    pub test_auc: Option<f64>,
    /// Training rows used, i.e. the aggregation weight.
    pub training_size: usize,
    /// Gradient-descent epochs the fit ran.
    pub epochs: usize,
    /// Whether the fit reached the gradient tolerance within `max_epochs`.
    pub converged: bool,
}

/// Fits an L2-regularized logistic regression on a client's training split.
///
/// Every call starts from zero weights; nothing carries over between rounds.
#[derive(Clone, Debug, Default)]
pub struct LocalTrainer {
    config: LocalTrainingConfig,
}

impl LocalTrainer {
    pub fn new(config: LocalTrainingConfig) -> Result<Self, FedError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LocalTrainingConfig {
        &self.config
    }

    /// The configured learning rate, capped at `1 / L` where `L` bounds the
    /// curvature of the regularized mean log-loss on `x`.
    fn step_size(&self, x: &Array2<f64>, lambda: f64) -> f64 {
        let n = x.nrows().max(1) as f64;
        let curvature = 0.25 * (x.iter().map(|v| v * v).sum::<f64>() + n) / n + 2.0 * lambda;
        self.config.learning_rate.min(1.0 / curvature)
    }

    pub fn train(&self, client: &ClientDataset) -> Result<LocalOutcome, TrainingError> {
        let train = client.train();
        if let Some(class) = train.single_class() {
            return Err(TrainingError::DegenerateLabels { class: class as u8 });
        }

        let n = train.rows();
        let l2 = L2::from_inverse_strength(self.config.inverse_regularization, n);
        let trainer = Trainer::builder(
            BCEWithLogitsLoss,
            SGD::new(self.step_size(train.features(), l2.lambda())),
            l2,
        )
        .batch_size(self.config.batch_size)
        .shuffle(self.config.batch_size.is_some())
        .max_epochs(self.config.max_epochs)
        .tolerance(self.config.tolerance)
        .seed(self.config.seed)
        .build();
        let (fitted, summary) = trainer.fit_with_summary(LogisticRegression::new(client.n_features()), train)?;
        if !summary.converged {
            log::warn!(
                "client '{}': local fit stopped at {} epoch(s) without reaching tolerance {:e}",
                client.id(),
                summary.epochs,
                self.config.tolerance
            );
        }

        let train_proba = fitted.predict_proba(train.features());
        let training_loss = metrics::log_loss(train.targets(), &train_proba);

        let test = client.test();
        let test_proba = fitted.predict_proba(test.features());
        let test_pred = fitted.predict_labels(test.features());
        let outcome = LocalOutcome {
            training_loss,
            test_accuracy: metrics::accuracy(test.targets(), &test_pred),
            test_auc: metrics::roc_auc_score(test.targets(), &test_proba),
            training_size: n,
            epochs: summary.epochs,
            converged: summary.converged,
            params: fitted.into_params(),
        };

        log::trace!(
            "client '{}' trained: loss {:.4}, accuracy {:.4}",
            client.id(),
            outcome.training_loss,
            outcome.test_accuracy
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;

    fn client(train_y: Vec<f64>) -> ClientDataset {
        let train_x: Vec<Vec<f64>> = train_y
            .iter()
            .enumerate()
            .map(|(i, &t)| vec![if t == 1.0 { 1.0 } else { -1.0 } + 0.1 * i as f64, 0.5])
            .collect();
        let train = InMemoryDataset::from_rows(train_x, train_y).unwrap();
        let test = InMemoryDataset::from_rows(
            vec![vec![-1.2, 0.5], vec![-0.8, 0.5], vec![1.1, 0.5], vec![0.9, 0.5]],
            vec![0.0, 0.0, 1.0, 1.0],
        )
        .unwrap();
        ClientDataset::new("c", train, test).unwrap()
    }

    #[test]
    fn test_train_reports_metrics() {
        let c = client(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let outcome = LocalTrainer::default().train(&c).unwrap();

        assert_eq!(outcome.training_size, 6);
        assert_eq!(outcome.params.n_features(), 2);
        assert!(outcome.params.coefficients[0] > 0.0);
        assert_eq!(outcome.test_accuracy, 1.0);
        assert_eq!(outcome.test_auc, Some(1.0));
        assert!(outcome.training_loss < std::f64::consts::LN_2);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let c = client(vec![1.0, 1.0, 1.0]);
        assert_eq!(
            LocalTrainer::default().train(&c),
            Err(TrainingError::DegenerateLabels { class: 1 })
        );
    }

    #[test]
    fn test_training_is_deterministic() {
        let c = client(vec![0.0, 1.0, 1.0, 0.0, 1.0]);
        let trainer = LocalTrainer::default();
        assert_eq!(trainer.train(&c).unwrap(), trainer.train(&c).unwrap());
    }

    #[test]
    fn test_step_size_is_capped() {
        let trainer = LocalTrainer::default();
        let x = Array2::from_elem((4, 2), 3.0);
        // curvature bound 0.25 * (72 + 4) / 4 + 2 = 6.75
        assert!((trainer.step_size(&x, 1.0) - 1.0 / 6.75).abs() < 1e-12);
        assert_eq!(trainer.step_size(&Array2::zeros((4, 2)), 0.0), 0.5);
    }

    /// Standardized, resampled client with many weakly informative features.
    fn wide_client(n_rows: usize, n_features: usize) -> ClientDataset {
        use crate::dataset::SurveyTable;
        use crate::federated::Partitioner;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(17);
        let informative = n_features.div_ceil(3) as f64;
        let centre = 1.5 * (0.4 * informative - 0.1 * (n_features as f64 - informative));
        let (mut rows, mut labels) = (Vec::new(), Vec::new());
        for _ in 0..n_rows {
            let x: Vec<f64> = (0..n_features).map(|_| rng.random_range(0..4) as f64).collect();
            let score: f64 = x
                .iter()
                .enumerate()
                .map(|(j, v)| if j % 3 == 0 { 0.4 * v } else { -0.1 * v })
                .sum::<f64>()
                - centre
                + rng.random_range(-2.0..2.0);
            labels.push(if score > 0.0 { 1.0 } else { 0.0 });
            rows.push(x);
        }
        let table = SurveyTable::from_rows(rows, labels, vec!["US".to_string(); n_rows]).unwrap();
        Partitioner::default().partition(&table).clients.remove(0)
    }

    #[test]
    fn test_default_config_converges_on_wide_client() {
        let c = wide_client(400, 22);
        assert_eq!(c.n_features(), 22);

        let default = LocalTrainer::default().train(&c).unwrap();
        assert!(default.converged, "stopped after {} epochs", default.epochs);
        assert!(default.epochs < LocalTrainingConfig::default().max_epochs);

        let tight = LocalTrainer::new(LocalTrainingConfig::default().with_tolerance(1e-8))
            .unwrap()
            .train(&c)
            .unwrap();
        let max_diff = default
            .params
            .coefficients
            .iter()
            .zip(tight.params.coefficients.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_diff < 0.05, "max coefficient difference {}", max_diff);
        assert!((default.training_loss - tight.training_loss).abs() < 1e-3);
    }

    #[test]
    fn test_epoch_cap_is_reported() {
        let c = wide_client(200, 6);
        let capped = LocalTrainer::new(LocalTrainingConfig::default().with_max_epochs(2))
            .unwrap()
            .train(&c)
            .unwrap();
        assert_eq!(capped.epochs, 2);
        assert!(!capped.converged);
    }

    #[test]
    fn test_stronger_regularization_shrinks_weights() {
        let c = client(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let weak = LocalTrainer::default().train(&c).unwrap();
        let strong = LocalTrainer::new(LocalTrainingConfig::default().with_inverse_regularization(0.01))
            .unwrap()
            .train(&c)
            .unwrap();
        assert!(strong.params.coefficients[0].abs() < weak.params.coefficients[0].abs());
    }
}
