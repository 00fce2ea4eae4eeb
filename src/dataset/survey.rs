//! Group-keyed survey table consumed by the partitioner.

use crate::error::FedError;
use ndarray::{Array1, Array2, Axis};

/// Encoded survey responses with a binary target and a partition key per row.
///
/// Categorical encoding and cleaning happen upstream; the table only checks
/// that the result is well formed. Construction fails fast on malformed
/// input so that nothing downstream has to re-validate it.
#[derive(Clone, Debug)]
pub struct SurveyTable {
    features: Array2<f64>,
    labels: Array1<f64>,
    groups: Vec<String>,
}

impl SurveyTable {
    /// Validates and wraps an encoded table.
    ///
    /// # Errors
    /// - [`FedError::EmptyData`] if there are no rows or no feature columns
    /// - [`FedError::InvalidShape`] if labels or group keys do not match the row count
    /// - [`FedError::InvalidLabel`] if a label is not `0` or `1`
    /// - [`FedError::InvalidParameter`] if a feature is NaN or infinite
    pub fn new(
        features: Array2<f64>,
        labels: Array1<f64>,
        groups: Vec<String>,
    ) -> Result<Self, FedError> {
        let (rows, cols) = features.dim();
        if rows == 0 || cols == 0 {
            return Err(FedError::EmptyData(format!(
                "survey table has shape ({}, {})",
                rows, cols
            )));
        }
        if labels.len() != rows {
            return Err(FedError::InvalidShape {
                expected: format!("{} labels", rows),
                got: format!("{} labels", labels.len()),
            });
        }
        if groups.len() != rows {
            return Err(FedError::InvalidShape {
                expected: format!("{} group keys", rows),
                got: format!("{} group keys", groups.len()),
            });
        }
        if let Some((row, &value)) = labels
            .iter()
            .enumerate()
            .find(|(_, &v)| v != 0.0 && v != 1.0)
        {
            return Err(FedError::InvalidLabel { row, value });
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(FedError::InvalidParameter(
                "survey features contain NaN or infinite values".into(),
            ));
        }
        Ok(Self {
            features,
            labels,
            groups,
        })
    }

    /// Builds a table from row vectors; every row must have the same width.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        labels: Vec<f64>,
        groups: Vec<String>,
    ) -> Result<Self, FedError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(FedError::FeatureMismatch {
                expected_features: width,
                got_features: bad.len(),
            });
        }
        let n = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let features =
            Array2::from_shape_vec((n, width), flat).map_err(|e| FedError::InvalidShape {
                expected: format!("({}, {})", n, width),
                got: e.to_string(),
            })?;
        Self::new(features, Array1::from(labels), groups)
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array1<f64> {
        &self.labels
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Row indices per distinct group key, keys in order of first appearance.
    pub fn group_indices(&self) -> Vec<(String, Vec<usize>)> {
        let mut out: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, key) in self.groups.iter().enumerate() {
            match out.iter_mut().find(|(k, _)| k == key) {
                Some((_, rows)) => rows.push(i),
                None => out.push((key.clone(), vec![i])),
            }
        }
        out
    }

    /// Copies the selected rows out of the table.
    pub fn select(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (
            self.features.select(Axis(0), indices),
            self.labels.select(Axis(0), indices),
        )
    }
}
