//! Causal lag expansion of a spend matrix.
use ndarray::{Array3, ArrayBase, Axis, Data, Dimension, s};

use crate::{
    errors::{MMMError, MMMResult},
    validation::as_matrix,
};

/// expand_lags — build the zero-padded lag stack of a spend matrix.
///
/// Parameters
/// ----------
/// - `spends`: `&ArrayBase<S, D>`
///   Spend matrix, rows = chronological time steps, columns = channels.
///   Must be rank 2.
/// - `max_lag`: `usize`
///   Number of lag slots `L ∈ [0, max_lag)`; must not exceed the row count.
///
/// Returns
/// -------
/// `MMMResult<Array3<f64>>`
///   Tensor of shape `(rows, channels, max_lag)` with
///   `out[t, c, L] = spends[t - L, c]` when `t ≥ L` and `0` otherwise.
///
/// Errors
/// ------
/// - `MMMError::InvalidRank` if `spends` is not rank 2.
/// - `MMMError::MaxLagOutOfRange` if `max_lag > rows`.
///
/// Notes
/// -----
/// - No value from time `t' > t` ever lands in row `t`.
/// - `max_lag = 0` yields an empty lag axis.
pub fn expand_lags<S, D>(spends: &ArrayBase<S, D>, max_lag: usize) -> MMMResult<Array3<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let spends = as_matrix(spends, "spends")?;
    let (rows, channels) = spends.dim();
    if max_lag > rows {
        return Err(MMMError::MaxLagOutOfRange { max_lag, rows });
    }

    let mut lagged = Array3::<f64>::zeros((rows, channels, max_lag));
    for lag in 0..max_lag {
        lagged
            .index_axis_mut(Axis(2), lag)
            .slice_mut(s![lag.., ..])
            .assign(&spends.slice(s![..rows - lag, ..]));
    }
    Ok(lagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact lag stacking against a hand-built reference tensor.
    // - Lag-0 identity and causal zero padding.
    // - Rank and max_lag validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Compare the lag stack of a small spend matrix with its reference
    // tensor element by element.
    //
    // Given
    // -----
    // - Spends `[[10,20],[0,8],[1,30],[5,40]]` and `max_lag = 4`.
    //
    // Expect
    // ------
    // - Output equals the reference tensor exactly.
    fn expand_lags_matches_reference_tensor() {
        // Arrange
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];
        let expected = array![
            [[10.0, 0.0, 0.0, 0.0], [20.0, 0.0, 0.0, 0.0]],
            [[0.0, 10.0, 0.0, 0.0], [8.0, 20.0, 0.0, 0.0]],
            [[1.0, 0.0, 10.0, 0.0], [30.0, 8.0, 20.0, 0.0]],
            [[5.0, 1.0, 0.0, 10.0], [40.0, 30.0, 8.0, 20.0]]
        ];

        // Act
        let lagged = expand_lags(&spends, 4).unwrap();

        // Assert
        assert_eq!(lagged, expected);
    }

    #[test]
    // Purpose
    // -------
    // Check the lag-0 identity and the zero padding before history starts.
    //
    // Given
    // -----
    // - A `5×3` matrix with distinct positive entries and `max_lag = 3`.
    //
    // Expect
    // ------
    // - `out[t, c, 0] == spends[t, c]` for all `t, c`.
    // - `out[t, c, k] == 0` whenever `k > t`.
    fn expand_lags_is_causal() {
        // Arrange
        let spends = Array1::range(1.0, 16.0, 1.0).into_shape((5, 3)).unwrap();

        // Act
        let lagged = expand_lags(&spends, 3).unwrap();

        // Assert
        for t in 0..5 {
            for c in 0..3 {
                assert_eq!(lagged[[t, c, 0]], spends[[t, c]]);
                for k in (t + 1)..3 {
                    assert_eq!(lagged[[t, c, k]], 0.0);
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid inputs fail before any allocation.
    //
    // Given
    // -----
    // - A 1-D array.
    // - A `4×2` matrix with `max_lag = 5`.
    //
    // Expect
    // ------
    // - `InvalidRank` and `MaxLagOutOfRange` respectively.
    fn expand_lags_rejects_bad_inputs() {
        // Arrange
        let vector = array![1.0, 2.0];
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];

        // Act / Assert
        assert!(matches!(expand_lags(&vector, 1), Err(MMMError::InvalidRank { found: 1, .. })));
        assert_eq!(
            expand_lags(&spends, 5).unwrap_err(),
            MMMError::MaxLagOutOfRange { max_lag: 5, rows: 4 }
        );
    }

    #[test]
    // Purpose
    // -------
    // `max_lag` equal to the number of rows is the largest accepted value.
    //
    // Given
    // -----
    // - A `2×1` matrix and `max_lag = 2`.
    //
    // Expect
    // ------
    // - Shape `(2, 1, 2)` with the single lagged entry carried over.
    fn expand_lags_accepts_max_lag_equal_to_rows() {
        // Arrange
        let spends = array![[3.0], [4.0]];

        // Act
        let lagged = expand_lags(&spends, 2).unwrap();

        // Assert
        assert_eq!(lagged.dim(), (2, 1, 2));
        assert_eq!(lagged[[1, 0, 1]], 3.0);
    }
}
