//! Seeded train/test splitting.

use crate::error::FedError;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// The four arrays produced by [`train_test_split`].
#[derive(Clone, Debug)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Splits rows into a training and a test part.
///
/// The rows are permuted with a generator seeded by `seed`; the first
/// `ceil(test_size * n)` permuted rows form the test part, the rest the
/// training part. Both parts must end up non-empty.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, FedError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(FedError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = x.nrows();
    if n != y.len() {
        return Err(FedError::InvalidShape {
            expected: format!("{} targets", n),
            got: format!("{} targets", y.len()),
        });
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(FedError::EmptyData(format!(
            "{} rows cannot be split with test_size {}",
            n, test_size
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let (test_idx, train_idx) = order.split_at(n_test);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: y.select(Axis(0), train_idx),
        y_test: y.select(Axis(0), test_idx),
    })
}
