//! Class-balancing resamplers.

pub mod smote;

pub use smote::Smote;

use std::fmt;

/// Why a training split could not be oversampled.
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleError {
    /// Only one class is present, there is no minority to grow.
    SingleClass { label: u8 },
    /// Fewer than two minority samples: no neighbour to interpolate toward.
    TooFewMinority { count: usize },
    /// The neighbour count is zero or not smaller than the minority count.
    InvalidNeighbors { k_neighbors: usize, minority: usize },
    /// Feature rows and labels disagree in length.
    ShapeMismatch { rows: usize, labels: usize },
}

impl fmt::Display for ResampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResampleError::SingleClass { label } => {
                write!(f, "only class {} present", label)
            }
            ResampleError::TooFewMinority { count } => {
                write!(f, "{} minority sample(s), at least 2 required", count)
            }
            ResampleError::InvalidNeighbors {
                k_neighbors,
                minority,
            } => write!(
                f,
                "k_neighbors = {} is invalid for {} minority samples",
                k_neighbors, minority
            ),
            ResampleError::ShapeMismatch { rows, labels } => {
                write!(f, "{} rows but {} labels", rows, labels)
            }
        }
    }
}

impl std::error::Error for ResampleError {}
