//! Error types for the federated simulation.
//!
//! Three families are kept apart because they are handled differently:
//! - [`FedError`] is fail-fast: malformed input or configuration, I/O and
//!   (de)serialization failures. It is returned before any round runs.
//! - [`DataInsufficiency`] explains why a candidate client group was excluded
//!   by the partitioner. It is collected, never propagated.
//! - [`TrainingError`] explains why a client could not produce a local model
//!   in a given round. The coordinator records it as a metrics gap.

use crate::preprocessing::resampling::ResampleError;
use std::fmt;

/// Fail-fast error type for validation, configuration and persistence.
#[derive(Debug)]
pub enum FedError {
    /// Shape mismatch between expected and actual array dimensions.
    InvalidShape { expected: String, got: String },
    /// Feature width differs from the width fixed earlier in the pipeline.
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// A label outside `{0, 1}` was supplied for a binary target.
    InvalidLabel { row: usize, value: f64 },
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Invalid hyperparameter or configuration value.
    InvalidParameter(String),
    /// The coordinator was started without any client.
    NoClients,
    /// Serialization or deserialization error.
    SerializationError(String),
    /// I/O error during file operations.
    IoError(String),
}

impl fmt::Display for FedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FedError::InvalidShape { expected, got } => {
                write!(f, "Invalid shape: expected {}, got {}", expected, got)
            }
            FedError::FeatureMismatch {
                expected_features,
                got_features,
            } => write!(
                f,
                "Feature mismatch: expected {} features, got {}",
                expected_features, got_features
            ),
            FedError::InvalidLabel { row, value } => {
                write!(f, "Invalid label at row {}: {} is not 0 or 1", row, value)
            }
            FedError::EmptyData(msg) => write!(f, "Empty data: {}", msg),
            FedError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            FedError::NoClients => write!(f, "No client datasets to federate"),
            FedError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            FedError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FedError {}

impl From<std::io::Error> for FedError {
    fn from(err: std::io::Error) -> Self {
        FedError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for FedError {
    fn from(err: bincode::Error) -> Self {
        FedError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for FedError {
    fn from(err: serde_json::Error) -> Self {
        FedError::SerializationError(err.to_string())
    }
}

/// Reason a candidate client group was excluded from the federation.
///
/// Exclusion is intended behaviour: undersized groups and groups whose
/// training split cannot be class-balanced never become clients.
#[derive(Debug, Clone, PartialEq)]
pub enum DataInsufficiency {
    /// The group has fewer rows than the configured minimum.
    TooFewRows {
        group: String,
        rows: usize,
        min_rows: usize,
    },
    /// The train/test split left one side without rows.
    EmptySplit { group: String, rows: usize },
    /// Minority oversampling could not be applied to the training split.
    ResamplingInfeasible {
        group: String,
        source: ResampleError,
    },
}

impl DataInsufficiency {
    /// Group key of the excluded candidate.
    pub fn group(&self) -> &str {
        match self {
            DataInsufficiency::TooFewRows { group, .. }
            | DataInsufficiency::EmptySplit { group, .. }
            | DataInsufficiency::ResamplingInfeasible { group, .. } => group,
        }
    }
}

impl fmt::Display for DataInsufficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataInsufficiency::TooFewRows {
                group,
                rows,
                min_rows,
            } => write!(
                f,
                "group '{}' has {} rows, at least {} required",
                group, rows, min_rows
            ),
            DataInsufficiency::EmptySplit { group, rows } => {
                write!(f, "group '{}' with {} rows cannot be split", group, rows)
            }
            DataInsufficiency::ResamplingInfeasible { group, source } => {
                write!(f, "group '{}' cannot be resampled: {}", group, source)
            }
        }
    }
}

impl std::error::Error for DataInsufficiency {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataInsufficiency::ResamplingInfeasible { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reason a client produced no local model in a round.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingError {
    /// Only one class is present in the training labels.
    DegenerateLabels { class: u8 },
    /// No training rows.
    EmptyData,
    /// Loss became NaN or infinite during optimisation.
    Diverged { epoch: usize },
    /// A batch could not be loaded from the dataset.
    DataAccess(String),
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingError::DegenerateLabels { class } => {
                write!(f, "training labels contain only class {}", class)
            }
            TrainingError::EmptyData => write!(f, "training data is empty"),
            TrainingError::Diverged { epoch } => {
                write!(f, "loss became non-finite at epoch {}", epoch)
            }
            TrainingError::DataAccess(msg) => write!(f, "data access failed: {}", msg),
        }
    }
}

impl std::error::Error for TrainingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = FedError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert!(err.to_string().contains("Feature mismatch"));
    }

    #[test]
    fn test_error_display_invalid_label() {
        let err = FedError::InvalidLabel { row: 4, value: 2.0 };
        let msg = err.to_string();
        assert!(msg.contains("row 4"));
        assert!(msg.contains("not 0 or 1"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: FedError = io_err.into();
        assert!(matches!(err, FedError::IoError(_)));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_err = serde_json::from_str::<Vec<f64>>("not json").unwrap_err();
        let err: FedError = json_err.into();
        assert!(matches!(err, FedError::SerializationError(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: Result<String, bincode::Error> = bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: FedError = e.into();
            assert!(matches!(err, FedError::SerializationError(_)));
        }
    }

    #[test]
    fn test_data_insufficiency_group_and_source() {
        let err = DataInsufficiency::ResamplingInfeasible {
            group: "Canada".to_string(),
            source: ResampleError::SingleClass { label: 1 },
        };
        assert_eq!(err.group(), "Canada");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("Canada"));

        let small = DataInsufficiency::TooFewRows {
            group: "Malta".to_string(),
            rows: 5,
            min_rows: 10,
        };
        assert!(std::error::Error::source(&small).is_none());
        assert!(small.to_string().contains("at least 10"));
    }

    #[test]
    fn test_training_error_display() {
        let err = TrainingError::DegenerateLabels { class: 0 };
        assert!(err.to_string().contains("only class 0"));
    }
}
