//! Size-weighted federated averaging.

use crate::error::FedError;
use crate::model::{ModelParameters, ParamOps};

/// A participant's contribution to one round: noised parameters and the
/// number of training rows they were fit on.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientUpdate {
    /// Position of the client in the coordinator's client list.
    pub client_index: usize,
    pub params: ModelParameters,
    pub training_size: usize,
}

/// Weighted mean of the updates' coefficients and intercepts, weights being
/// the training sizes.
///
/// Each update is scaled by its normalized weight and the results summed, so
/// a single update is returned exactly.
///
/// # Errors
/// - `EmptyData` for an empty slice (callers skip aggregation instead)
/// - `FeatureMismatch` when coefficient lengths differ
/// - `InvalidParameter` when the total weight is zero
pub fn federated_average(updates: &[ClientUpdate]) -> Result<ModelParameters, FedError> {
    let first = updates
        .first()
        .ok_or_else(|| FedError::EmptyData("no client updates to aggregate".into()))?;
    let n_features = first.params.n_features();
    if let Some(bad) = updates.iter().find(|u| u.params.n_features() != n_features) {
        return Err(FedError::FeatureMismatch {
            expected_features: n_features,
            got_features: bad.params.n_features(),
        });
    }

    let total: usize = updates.iter().map(|u| u.training_size).sum();
    if total == 0 {
        return Err(FedError::InvalidParameter(
            "aggregation weights sum to zero".into(),
        ));
    }
    log::debug!(
        "averaging {} update(s) from client(s) {:?} over {} training rows",
        updates.len(),
        updates.iter().map(|u| u.client_index).collect::<Vec<_>>(),
        total
    );

    Ok(updates
        .iter()
        .fold(ModelParameters::zeros(n_features), |acc, u| {
            acc.add(&u.params.scale(u.training_size as f64 / total as f64))
        }))
}
