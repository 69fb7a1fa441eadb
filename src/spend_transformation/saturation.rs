//! Saturation (diminishing-returns) kernels applied column by column.
use ndarray::{Array2, ArrayBase, Data, Dimension, Ix1, Zip};

use crate::{
    errors::MMMResult,
    validation::{as_matrix, validate_ecs, validate_half_saturations, validate_slopes},
};

/// Hill curve `1 / (1 + (x / ec)^(-slope))` for a single value.
///
/// `x = 0` with `slope > 0` gives `0^(-slope) = +inf` and therefore exactly
/// `0`; no special case is taken.
#[inline]
pub fn logistic(x: f64, ec: f64, slope: f64) -> f64 {
    1.0 / (1.0 + (x / ec).powf(-slope))
}

/// Reach curve `(1 - e^{-h·x}) / (1 + e^{-h·x})` for a single value.
#[inline]
pub fn reach(x: f64, half_saturation: f64) -> f64 {
    let decay = (-half_saturation * x).exp();
    (1.0 - decay) / (1.0 + decay)
}

/// logistic_saturation — apply the Hill curve per channel.
///
/// Parameters
/// ----------
/// - `values`: rank-2 matrix `(time, channel)`, usually carryover output.
/// - `ecs`: one half-effect point per channel, each in `[0, 1]`.
/// - `slopes`: one steepness per channel, each `≥ 0`.
///
/// Returns
/// -------
/// `MMMResult<Array2<f64>>` of the same shape as `values`. For
/// non-negative inputs every entry lies in `[0, 1]`.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank`, `MMMError::ChannelMismatch`,
///   `MMMError::InvalidEc`, `MMMError::InvalidSlope`.
pub fn logistic_saturation<S, D, E, P>(
    values: &ArrayBase<S, D>, ecs: &ArrayBase<E, Ix1>, slopes: &ArrayBase<P, Ix1>,
) -> MMMResult<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    E: Data<Elem = f64>,
    P: Data<Elem = f64>,
{
    let values = as_matrix(values, "spends")?;
    let channels = values.ncols();
    validate_ecs(ecs, channels)?;
    validate_slopes(slopes, channels)?;

    let mut out = values.to_owned();
    for (mut column, (&ec, &slope)) in out.columns_mut().into_iter().zip(ecs.iter().zip(slopes)) {
        column.mapv_inplace(|x| logistic(x, ec, slope));
    }
    Ok(out)
}

/// reach_saturation — apply the reach curve per channel.
///
/// Parameters
/// ----------
/// - `values`: rank-2 matrix `(time, channel)`.
/// - `half_saturations`: one rate per channel, each `≥ 0`.
///
/// Returns
/// -------
/// `MMMResult<Array2<f64>>` with entries in `[-1, 1]`, `0` at `x = 0`, and
/// increasing in `x` when the channel's rate is positive.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank`, `MMMError::ChannelMismatch`,
///   `MMMError::InvalidHalfSaturation`.
pub fn reach_saturation<S, D, H>(
    values: &ArrayBase<S, D>, half_saturations: &ArrayBase<H, Ix1>,
) -> MMMResult<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    H: Data<Elem = f64>,
{
    let values = as_matrix(values, "spends")?;
    validate_half_saturations(half_saturations, values.ncols())?;

    let mut out = values.to_owned();
    Zip::from(out.columns_mut()).and(half_saturations).for_each(|mut column, &h| {
        column.mapv_inplace(|x| reach(x, h));
    });
    Ok(out)
}
