use crate::dataset::Dataset;
use crate::error::FedError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::convert::Infallible;

/// Owned feature matrix and target vector.
///
/// Invariant: `x.nrows() == y.len()` and both are non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl InMemoryDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self, FedError> {
        if x.nrows() != y.len() {
            return Err(FedError::InvalidShape {
                expected: format!("{} targets", x.nrows()),
                got: format!("{} targets", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(FedError::EmptyData("dataset has no rows".into()));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FedError::InvalidParameter(
                "dataset contains NaN or infinite values".into(),
            ));
        }
        Ok(Self { x, y })
    }

    /// Builds a dataset from row vectors, checking that every row has the same width.
    pub fn from_rows(rows: Vec<Vec<f64>>, y: Vec<f64>) -> Result<Self, FedError> {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(FedError::FeatureMismatch {
                expected_features: n_features,
                got_features: bad.len(),
            });
        }
        let n_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let x = Array2::from_shape_vec((n_rows, n_features), flat).map_err(|e| {
            FedError::InvalidShape {
                expected: format!("({}, {})", n_rows, n_features),
                got: e.to_string(),
            }
        })?;
        Self::new(x, Array1::from(y))
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn rows(&self) -> usize {
        self.x.nrows()
    }

    /// Number of rows whose target equals `label`.
    pub fn count_label(&self, label: f64) -> usize {
        self.y.iter().filter(|&&t| t == label).count()
    }

    /// Returns the single class present, or `None` when both occur.
    pub fn single_class(&self) -> Option<f64> {
        let first = self.y[0];
        self.y.iter().all(|&t| t == first).then_some(first)
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.x.row(i)
    }

    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>) {
        (self.x, self.y)
    }
}

impl Dataset for InMemoryDataset {
    type Error = Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.x.nrows())
    }

    fn n_features(&self) -> usize {
        self.x.ncols()
    }

    fn get_batch(&self, indices: &[usize]) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
        Ok((self.x.select(Axis(0), indices), self.y.select(Axis(0), indices)))
    }
}
