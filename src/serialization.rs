//! Serialization of fitted parameters.
//!
//! Fitted scalers, fitted models and the global model all persist through
//! a plain-data parameter representation, never through live arrays or
//! training state.

use crate::error::FedError;
use std::error::Error;
use std::path::Path;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data (vectors, scalars,
/// configuration flags).
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Writes a parameter representation to `path`.
pub fn save_params<P, Q>(params: &P, path: Q) -> Result<(), FedError>
where
    P: SerializableParams,
    Q: AsRef<Path>,
{
    let bytes = params
        .to_bytes()
        .map_err(|e| FedError::SerializationError(e.to_string()))?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reads a parameter representation previously written by [`save_params`].
pub fn load_params<P, Q>(path: Q) -> Result<P, FedError>
where
    P: SerializableParams,
    Q: AsRef<Path>,
{
    let bytes = std::fs::read(path)?;
    P::from_bytes(&bytes).map_err(|e| FedError::SerializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Sample {
        weights: Vec<f64>,
        bias: f64,
    }

    #[test]
    fn test_bytes_roundtrip() {
        let s = Sample {
            weights: vec![0.25, -1.5],
            bias: 3.0,
        };
        let bytes = s.to_bytes().unwrap();
        assert_eq!(Sample::from_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn test_save_load_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("sample.bin");
        let s = Sample {
            weights: vec![1.0],
            bias: 0.5,
        };
        save_params(&s, &path)?;
        let loaded: Sample = load_params(&path)?;
        assert_eq!(loaded, s);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<Sample, FedError> = load_params("/definitely/not/here.bin");
        assert!(matches!(result, Err(FedError::IoError(_))));
    }
}
