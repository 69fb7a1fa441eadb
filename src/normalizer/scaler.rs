//! Per-column linear rescalers and their fitted statistics.
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::MMMError;

/// Kind of linear rescaler.
///
/// - `MinMax`: maps each column's fitted `[min, max]` onto `[0, 1]`.
/// - `MaxAbs`: divides each column by its fitted maximum absolute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    MinMax,
    #[default]
    MaxAbs,
}

impl ScalerKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalerKind::MinMax => "min_max",
            ScalerKind::MaxAbs => "max_abs",
        }
    }

    /// Fit per-column statistics on already-transformed values.
    pub(crate) fn fit(self, values: ArrayView2<'_, f64>) -> FittedScaler {
        match self {
            ScalerKind::MinMax => {
                let data_min = values.fold_axis(Axis(0), f64::INFINITY, |acc, &x| acc.min(x));
                let data_max = values.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &x| acc.max(x));
                let range = (&data_max - &data_min).mapv(non_zero_scale);
                FittedScaler::MinMax { data_min, range }
            }
            ScalerKind::MaxAbs => {
                let max_abs = values.fold_axis(Axis(0), 0.0_f64, |acc, &x| acc.max(x.abs()));
                FittedScaler::MaxAbs { scale: max_abs.mapv(non_zero_scale) }
            }
        }
    }
}

impl FromStr for ScalerKind {
    type Err = MMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "min_max" => Ok(ScalerKind::MinMax),
            "max_abs" => Ok(ScalerKind::MaxAbs),
            _ => Err(MMMError::UnknownScaler { name: s.to_string() }),
        }
    }
}

/// Fitted scaler statistics, one entry per column.
///
/// Zero ranges (constant columns) and zero max-abs values are stored as `1`
/// so that scaling is always invertible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    MinMax { data_min: Array1<f64>, range: Array1<f64> },
    MaxAbs { scale: Array1<f64> },
}

impl FittedScaler {
    /// Number of columns the statistics were fitted on.
    pub fn n_columns(&self) -> usize {
        match self {
            FittedScaler::MinMax { data_min, .. } => data_min.len(),
            FittedScaler::MaxAbs { scale } => scale.len(),
        }
    }

    /// Scale `values` in place. Column `j` uses statistics `j % n_columns`,
    /// which broadcasts single-column statistics over any width.
    pub(crate) fn scale_inplace(&self, values: &mut Array2<f64>) {
        let n = self.n_columns();
        for (j, mut column) in values.columns_mut().into_iter().enumerate() {
            let k = j % n;
            match self {
                FittedScaler::MinMax { data_min, range } => {
                    let (lo, r) = (data_min[k], range[k]);
                    column.mapv_inplace(|x| (x - lo) / r);
                }
                FittedScaler::MaxAbs { scale } => {
                    let s = scale[k];
                    column.mapv_inplace(|x| x / s);
                }
            }
        }
    }

    /// Exact inverse of [`FittedScaler::scale_inplace`].
    pub(crate) fn unscale_inplace(&self, values: &mut Array2<f64>) {
        let n = self.n_columns();
        for (j, mut column) in values.columns_mut().into_iter().enumerate() {
            let k = j % n;
            match self {
                FittedScaler::MinMax { data_min, range } => {
                    let (lo, r) = (data_min[k], range[k]);
                    column.mapv_inplace(|x| x * r + lo);
                }
                FittedScaler::MaxAbs { scale } => {
                    let s = scale[k];
                    column.mapv_inplace(|x| x * s);
                }
            }
        }
    }
}

#[inline]
fn non_zero_scale(s: f64) -> f64 {
    if s == 0.0 { 1.0 } else { s }
}
