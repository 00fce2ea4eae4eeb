//! Dataset abstractions for training and evaluation.
//!
//! - [`Dataset`] gives uniform `(X, y)` access by row indices, with batch
//!   iteration in either stored or seeded-shuffled order.
//! - [`InMemoryDataset`] is the owned implementation used for every client
//!   split.
//! - [`SurveyTable`] is the raw, group-keyed input of the partitioner.
//! - [`train_test_split`] performs the seeded 80/20 style split.
//!
//! # Example
//!
//! ```rust
//! use fedsurvey::dataset::{Dataset, InMemoryDataset};
//! use ndarray::array;
//!
//! let x = array![[1.0], [2.0]];
//! let y = array![0.0, 1.0];
//! let dataset = InMemoryDataset::new(x, y).unwrap();
//!
//! for batch in dataset.batches(1) {
//!     let (x_batch, y_batch) = batch.unwrap();
//!     assert_eq!(x_batch.nrows(), y_batch.len());
//! }
//! ```

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::Debug;

pub mod memory;
pub mod split;
pub mod survey;

pub use self::memory::InMemoryDataset;
pub use self::split::{train_test_split, TrainTestSplit};
pub use self::survey::SurveyTable;

/// Abstract interface for a labelled dataset.
///
/// - `X`: feature matrix with shape `(n_samples, n_features)`
/// - `y`: target vector with shape `(n_samples,)`
pub trait Dataset {
    /// Error type returned when accessing data.
    type Error: Debug + 'static;

    /// Total number of samples, if known.
    fn len(&self) -> Option<usize>;

    /// Checks whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Number of feature columns.
    fn n_features(&self) -> usize;

    /// Loads the given rows, in the given order, as a feature matrix and target vector.
    fn get_batch(&self, indices: &[usize]) -> Result<(Array2<f64>, Array1<f64>), Self::Error>;

    /// Iterates over consecutive batches in stored order.
    ///
    /// The last batch may be smaller than `batch_size`.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        let order = (0..self.len().unwrap_or(0)).collect();
        DatasetBatchIter::new(self, order, batch_size)
    }

    /// Iterates over batches of a random permutation of the rows.
    fn shuffled_batches<R: Rng>(&self, batch_size: usize, rng: &mut R) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        let mut order: Vec<usize> = (0..self.len().unwrap_or(0)).collect();
        order.shuffle(rng);
        DatasetBatchIter::new(self, order, batch_size)
    }
}

/// Iterator over dataset batches.
///
/// Created by [`Dataset::batches`] or [`Dataset::shuffled_batches`]. Data is
/// fetched lazily; errors from [`Dataset::get_batch`] are yielded as
/// `Some(Err(_))`.
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    order: Vec<usize>,
    batch_size: usize,
    current: usize,
}

impl<'a, D: ?Sized> DatasetBatchIter<'a, D> {
    fn new(dataset: &'a D, order: Vec<usize>, batch_size: usize) -> Self {
        Self {
            dataset,
            order,
            batch_size,
            current: 0,
        }
    }
}

impl<'a, D: Dataset> Iterator for DatasetBatchIter<'a, D> {
    type Item = Result<(Array2<f64>, Array1<f64>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        // A zero batch size would never advance.
        if self.batch_size == 0 || self.current >= self.order.len() {
            return None;
        }

        let end = (self.current + self.batch_size).min(self.order.len());
        let indices = &self.order[self.current..end];
        self.current = end;

        Some(self.dataset.get_batch(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // Row i holds [2i, 2i + 1] with target i.
    struct MockDataset {
        len: usize,
    }

    impl Dataset for MockDataset {
        type Error = &'static str;

        fn len(&self) -> Option<usize> {
            Some(self.len)
        }

        fn n_features(&self) -> usize {
            2
        }

        fn get_batch(&self, indices: &[usize]) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
            if indices.iter().any(|&i| i >= self.len) {
                return Err("index out of bounds");
            }
            let mut x = Array2::zeros((indices.len(), 2));
            for (row, &i) in indices.iter().enumerate() {
                x[[row, 0]] = (2 * i) as f64;
                x[[row, 1]] = (2 * i + 1) as f64;
            }
            let y = indices.iter().map(|&i| i as f64).collect();
            Ok((x, y))
        }
    }

    #[test]
    fn test_dataset_is_empty() {
        assert!(MockDataset { len: 0 }.is_empty());
        assert!(!MockDataset { len: 1 }.is_empty());
    }

    #[test]
    fn test_batches_full() {
        let dataset = MockDataset { len: 6 };
        let mut iter = dataset.batches(2);

        for i in 0..3 {
            let (x, y) = iter.next().unwrap().unwrap();
            assert_eq!(x.dim(), (2, 2));
            assert_eq!(y.to_vec(), vec![i as f64 * 2.0, i as f64 * 2.0 + 1.0]);
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_partial_last() {
        let dataset = MockDataset { len: 5 };
        let mut iter = dataset.batches(2);

        assert_eq!(iter.next().unwrap().unwrap().0.nrows(), 2);
        assert_eq!(iter.next().unwrap().unwrap().0.nrows(), 2);
        assert_eq!(iter.next().unwrap().unwrap().0.nrows(), 1);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_zero_size_yields_nothing() {
        let dataset = MockDataset { len: 3 };
        assert!(dataset.batches(0).next().is_none());
    }

    #[test]
    fn test_shuffled_batches_cover_every_row_once() {
        let dataset = MockDataset { len: 7 };
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen: Vec<f64> = dataset
            .shuffled_batches(3, &mut rng)
            .flat_map(|b| b.unwrap().1.to_vec())
            .collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(seen, (0..7).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_batches_are_seed_deterministic() {
        let dataset = MockDataset { len: 10 };
        let collect = |seed| -> Vec<f64> {
            let mut rng = StdRng::seed_from_u64(seed);
            dataset
                .shuffled_batches(4, &mut rng)
                .flat_map(|b| b.unwrap().1.to_vec())
                .collect()
        };
        assert_eq!(collect(7), collect(7));
    }
}
