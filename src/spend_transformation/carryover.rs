//! Carryover kernels: lag-weighted averages over the lag axis.
//!
//! Both kernels reduce a `(time × channel × lag)` tensor to a
//! `(time × channel)` matrix. For channel `c` the output at time `t` is
//! `Σ_L w_c[L]·x[t, c, L] / Σ_L w_c[L]`, accumulated in lag order.
use ndarray::{Array1, Array2, ArrayBase, ArrayView3, Axis, Data, Dimension, Ix1};

use crate::{
    errors::MMMResult,
    validation::{as_tensor, validate_delays, validate_retain_rates},
};

/// geometric_decay — carryover with weights `retain_rate^L`.
///
/// Parameters
/// ----------
/// - `lagged`: `&ArrayBase<S, D>`
///   Lagged spend tensor from [`expand_lags`](super::expand_lags); rank 3.
/// - `retain_rates`: one rate per channel, each in `[0, 1]`.
///
/// Returns
/// -------
/// `MMMResult<Array2<f64>>` of shape `(time, channel)`.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank` if `lagged` is not rank 3.
/// - `MMMError::ChannelMismatch` if `retain_rates.len()` differs from the
///   channel count.
/// - `MMMError::InvalidRetainRate` for a rate outside `[0, 1]`.
///
/// Notes
/// -----
/// - `0^0 = 1`, so a zero retain rate keeps only the current period.
pub fn geometric_decay<S, D, R>(
    lagged: &ArrayBase<S, D>, retain_rates: &ArrayBase<R, Ix1>,
) -> MMMResult<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    R: Data<Elem = f64>,
{
    let lagged = as_tensor(lagged, "lagged_spends")?;
    let (_, channels, max_lag) = lagged.dim();
    validate_retain_rates(retain_rates, channels)?;

    Ok(apply_lag_weights(lagged, |channel| {
        geometric_weights(retain_rates[channel], max_lag)
    }))
}

/// peaked_decay — adstock carryover peaking `delay` lags after the spend.
///
/// Weight at lag `L` is `retain_rate^((L - delay)^2)`, a symmetric bump
/// centred on `delay` that decays outward at `retain_rate`.
///
/// Parameters
/// ----------
/// - `lagged`: rank-3 lagged spend tensor.
/// - `delays`: one delay per channel, each in `[0, max_lag]` where
///   `max_lag = lagged.shape()[2]`.
/// - `retain_rates`: one rate per channel, each in `[0, 1]`.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank`, `MMMError::ChannelMismatch`,
///   `MMMError::InvalidDelay`, `MMMError::InvalidRetainRate`.
///
/// Notes
/// -----
/// - With `delay = 0` the weights are `r^(L²)`; this coincides with
///   [`geometric_decay`] only for `max_lag ≤ 2` or `r ∈ {0, 1}`.
pub fn peaked_decay<S, D, R, T>(
    lagged: &ArrayBase<S, D>, delays: &ArrayBase<T, Ix1>, retain_rates: &ArrayBase<R, Ix1>,
) -> MMMResult<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    R: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    let lagged = as_tensor(lagged, "lagged_spends")?;
    let (_, channels, max_lag) = lagged.dim();
    validate_delays(delays, channels, max_lag)?;
    validate_retain_rates(retain_rates, channels)?;

    Ok(apply_lag_weights(lagged, |channel| {
        peaked_weights(retain_rates[channel], delays[channel], max_lag)
    }))
}

/// Lag weights `r^L` for `L ∈ [0, max_lag)`.
pub fn geometric_weights(retain_rate: f64, max_lag: usize) -> Array1<f64> {
    Array1::from_iter((0..max_lag).map(|lag| retain_rate.powf(lag as f64)))
}

/// Lag weights `r^((L - delay)^2)` for `L ∈ [0, max_lag)`.
pub fn peaked_weights(retain_rate: f64, delay: f64, max_lag: usize) -> Array1<f64> {
    Array1::from_iter((0..max_lag).map(|lag| retain_rate.powf((lag as f64 - delay).powi(2))))
}

/// Normalized dot product of each lag row with its channel's weights.
///
/// A lag row `[x_0, …, x_{m-1}]` maps to `Σ x_L·w_L / Σ w_L`, both sums
/// accumulated left to right.
pub(crate) fn weighted_lag_mean(lag_row: &[f64], weights: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut total = 0.0;
    for (x, w) in lag_row.iter().zip(weights) {
        dot += x * w;
        total += w;
    }
    dot / total
}

fn apply_lag_weights<F>(lagged: ArrayView3<'_, f64>, weights_for: F) -> Array2<f64>
where
    F: Fn(usize) -> Array1<f64>,
{
    let (rows, channels, _) = lagged.dim();
    let mut out = Array2::<f64>::zeros((rows, channels));
    for channel in 0..channels {
        let weights = weights_for(channel).to_vec();
        let per_channel = lagged.index_axis(Axis(1), channel);
        for (t, lag_row) in per_channel.outer_iter().enumerate() {
            out[[t, channel]] = weighted_lag_mean(&lag_row.to_vec(), &weights);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MMMError;
    use crate::spend_transformation::expand_lags;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reference vectors for both kernels on a 4×2 spend matrix.
    // - Normalization of the weights.
    // - Domain errors for retain rates and delays.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-12;

    fn lagged_reference() -> ndarray::Array3<f64> {
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];
        expand_lags(&spends, 4).unwrap()
    }

    fn assert_matrix_close(got: &Array2<f64>, expected: &Array2<f64>) {
        assert_eq!(got.dim(), expected.dim());
        for (g, e) in got.iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e, epsilon = TOL, max_relative = TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the peaked kernel against its reference output.
    //
    // Given
    // -----
    // - The reference lag stack, `delays = [2.5, 2]`,
    //   `retain_rates = [0.2, 0.9]`.
    //
    // Expect
    // ------
    // - Output matches the reference matrix to 1e-12 relative.
    fn peaked_decay_matches_reference() {
        // Arrange
        let lagged = lagged_reference();
        let expected = array![
            [0.00031371564813652915, 3.796765139897573],
            [0.19607228008533067, 6.726888689563381],
            [4.90183837369808, 13.565290356181823],
            [4.921571087965868, 22.928734700963517]
        ];

        // Act
        let out = peaked_decay(&lagged, &array![2.5, 2.0], &array![0.2, 0.9]).unwrap();

        // Assert
        assert_matrix_close(&out, &expected);
    }

    #[test]
    // Purpose
    // -------
    // Verify the geometric kernel against its reference output.
    //
    // Given
    // -----
    // - The reference lag stack and `retain_rates = [0.2, 0.9]`.
    //
    // Expect
    // ------
    // - Output matches the reference matrix to 1e-12 relative.
    fn geometric_decay_matches_reference() {
        // Arrange
        let lagged = lagged_reference();
        let expected = array![
            [8.012820512820513, 5.815644082582146],
            [1.6025641025641026, 7.560337307356789],
            [1.1217948717948718, 15.527769700494332],
            [4.230769230769231, 25.60628089560919]
        ];

        // Act
        let out = geometric_decay(&lagged, &array![0.2, 0.9]).unwrap();

        // Assert
        assert_matrix_close(&out, &expected);
    }

    #[test]
    // Purpose
    // -------
    // A constant lag row maps to itself because the weights are normalized.
    //
    // Given
    // -----
    // - Lag row `[3, 3, 3, 3]` and several weight shapes.
    //
    // Expect
    // ------
    // - `weighted_lag_mean` returns 3 for each.
    fn weighted_lag_mean_preserves_constants() {
        // Arrange
        let row = [3.0; 4];

        // Act / Assert
        for weights in [geometric_weights(0.3, 4), peaked_weights(0.7, 1.5, 4)] {
            assert_relative_eq!(weighted_lag_mean(&row, weights.as_slice().unwrap()), 3.0, epsilon = TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // With `delay = 0` and two lag slots, peaked and geometric kernels
    // coincide (`r^(L²) = r^L` for `L ∈ {0, 1}`).
    //
    // Given
    // -----
    // - A lag stack with `max_lag = 2`, zero delays, `retain_rates = [0.4, 0.8]`.
    //
    // Expect
    // ------
    // - Identical outputs.
    fn peaked_with_zero_delay_reduces_to_geometric() {
        // Arrange
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];
        let lagged = expand_lags(&spends, 2).unwrap();
        let rates = array![0.4, 0.8];

        // Act
        let peaked = peaked_decay(&lagged, &array![0.0, 0.0], &rates).unwrap();
        let geometric = geometric_decay(&lagged, &rates).unwrap();

        // Assert
        assert_matrix_close(&peaked, &geometric);
    }

    #[test]
    // Purpose
    // -------
    // Domain violations surface before any computation.
    //
    // Given
    // -----
    // - A retain rate of -0.1, and a delay of 4.5 with `max_lag = 4`.
    //
    // Expect
    // ------
    // - `InvalidRetainRate` and `InvalidDelay` respectively.
    fn carryover_rejects_out_of_domain_parameters() {
        // Arrange
        let lagged = lagged_reference();

        // Act
        let rate_err = geometric_decay(&lagged, &array![-0.1, 0.5]).unwrap_err();
        let delay_err = peaked_decay(&lagged, &array![1.0, 4.5], &array![0.5, 0.5]).unwrap_err();

        // Assert
        assert_eq!(rate_err, MMMError::InvalidRetainRate { index: 0, value: -0.1 });
        assert_eq!(delay_err, MMMError::InvalidDelay { index: 1, value: 4.5, max_lag: 4 });
    }

    #[test]
    // Purpose
    // -------
    // A matrix is not a lag tensor.
    //
    // Given
    // -----
    // - A `4×2` matrix passed as `lagged`.
    //
    // Expect
    // ------
    // - `InvalidRank { expected: 3, found: 2 }`.
    fn carryover_requires_rank_three() {
        // Arrange
        let matrix = array![[1.0, 2.0], [3.0, 4.0]];

        // Act
        let err = geometric_decay(&matrix, &array![0.5, 0.5]).unwrap_err();

        // Assert
        assert!(matches!(err, MMMError::InvalidRank { expected: 3, found: 2, .. }));
    }
}
