//! Synthetic Minority Over-sampling (SMOTE).
//!
//! Each synthetic row is `x_i + gap * (x_nn - x_i)` where `x_i` is a
//! uniformly chosen minority row, `x_nn` one of its `k` nearest minority
//! neighbours (Euclidean) and `gap` uniform in `[0, 1)`. Rows are generated
//! until the minority count equals the majority count.

use super::ResampleError;
use crate::preprocessing::traits::Resampler;
use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// SMOTE oversampler for binary `0.0` / `1.0` labels.
#[derive(Clone, Debug)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

impl Smote {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Largest usable neighbour count for a minority class of `minority` rows,
    /// capped at `max_k`: `min(max_k, minority - 1)`.
    pub fn neighbors_for(minority: usize, max_k: usize) -> usize {
        max_k.min(minority.saturating_sub(1))
    }
}

impl Resampler for Smote {
    type Error = ResampleError;

    fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
        if x.nrows() != y.len() {
            return Err(ResampleError::ShapeMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        if y.is_empty() {
            return Err(ResampleError::TooFewMinority { count: 0 });
        }

        let n_pos = y.iter().filter(|&&t| t == 1.0).count();
        let n_neg = y.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            let label = if n_pos == 0 { 0 } else { 1 };
            return Err(ResampleError::SingleClass { label });
        }

        let (minority_label, n_min, n_maj) = if n_pos < n_neg {
            (1.0, n_pos, n_neg)
        } else {
            (0.0, n_neg, n_pos)
        };
        if n_min == n_maj {
            return Ok((x.clone(), y.clone()));
        }
        if n_min < 2 {
            return Err(ResampleError::TooFewMinority { count: n_min });
        }
        let k = self.k_neighbors;
        if k == 0 || k >= n_min {
            return Err(ResampleError::InvalidNeighbors {
                k_neighbors: k,
                minority: n_min,
            });
        }

        let minority_idx: Vec<usize> = y
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == minority_label)
            .map(|(i, _)| i)
            .collect();
        let minority = x.select(Axis(0), &minority_idx);
        let neighbors = nearest_neighbors(&minority, k);

        let n = x.nrows();
        let n_new = n_maj - n_min;
        let mut x_out = Array2::zeros((n + n_new, x.ncols()));
        x_out.slice_mut(s![..n, ..]).assign(x);

        let mut rng = StdRng::seed_from_u64(self.seed);
        for row in 0..n_new {
            let i = rng.random_range(0..n_min);
            let nn = neighbors[i][rng.random_range(0..k)];
            let gap: f64 = rng.random();
            let base = minority.row(i);
            let synthetic = &base + &((&minority.row(nn) - &base) * gap);
            x_out.row_mut(n + row).assign(&synthetic);
        }

        let mut y_out = y.to_vec();
        y_out.resize(n + n_new, minority_label);

        log::trace!(
            "smote: {} minority rows grown by {} with k = {}",
            n_min,
            n_new,
            k
        );
        Ok((x_out, Array1::from(y_out)))
    }
}

/// Indices of the `k` nearest other rows for each row, nearest first.
/// Ties are broken by row index.
fn nearest_neighbors(points: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
    let n = points.nrows();
    (0..n)
        .map(|i| {
            let mut dists: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let d = &points.row(i) - &points.row(j);
                    (d.dot(&d), j)
                })
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}
