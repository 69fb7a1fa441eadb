//! Point estimates from posterior draws.
use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use super::runtime::Draws;
use crate::errors::{MMMError, MMMResult};

/// Reduction applied over the draw axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    #[default]
    Mean,
    Median,
}

impl Estimator {
    pub fn name(self) -> &'static str {
        match self {
            Estimator::Mean => "mean",
            Estimator::Median => "median",
        }
    }
}

impl FromStr for Estimator {
    type Err = MMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Estimator::Mean),
            "median" => Ok(Estimator::Median),
            _ => Err(MMMError::UnknownEstimator { name: s.to_string() }),
        }
    }
}

/// estimate_parameters — reduce each parameter's draws to a point estimate.
///
/// Parameters
/// ----------
/// - `draws`: draws by name, leading axis = draws.
/// - `estimator`: mean or median over that axis.
///
/// Returns
/// -------
/// `MMMResult<BTreeMap<String, ArrayD<f64>>>` with the draw axis removed
/// (a scalar parameter becomes 0-D). Feed it to
/// `ParameterSet::from_named`.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank` for an array without a draw axis.
/// - `MMMError::InvalidSetting` for an empty draw axis.
pub fn estimate_parameters(draws: &Draws, estimator: Estimator) -> MMMResult<BTreeMap<String, ArrayD<f64>>> {
    let mut estimates = BTreeMap::new();
    for (name, values) in draws {
        if values.ndim() == 0 {
            return Err(MMMError::InvalidRank { name: "draws", expected: 1, found: 0 });
        }
        if values.len_of(Axis(0)) == 0 {
            return Err(MMMError::InvalidSetting { field: "draws", reason: "no draws to estimate from" });
        }
        let estimate = match estimator {
            Estimator::Mean => values.mean_axis(Axis(0)).ok_or(MMMError::InvalidSetting {
                field: "draws",
                reason: "no draws to estimate from",
            })?,
            Estimator::Median => values.map_axis(Axis(0), |lane| Data::new(lane.to_vec()).median()),
        };
        estimates.insert(name.clone(), estimate);
    }
    debug!(estimator = estimator.name(), parameters = estimates.len(), "estimated parameters");
    Ok(estimates)
}
