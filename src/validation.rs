//! validation — shared shape and parameter-domain checks.
//!
//! Every public entry point that accepts an `ndarray` of arbitrary rank goes
//! through [`as_matrix`] / [`as_tensor`] / [`as_vector`], so wrong-rank input
//! surfaces as [`MMMError::InvalidRank`] instead of a panic. The per-channel
//! validators check length first and then domain, reporting the first
//! offending channel.
use ndarray::{ArrayBase, ArrayView1, ArrayView2, ArrayView3, Data, Dimension, Ix1, Ix2, Ix3};

use crate::errors::{MMMError, MMMResult};

/// View `x` as a 2-D matrix or fail with `InvalidRank`.
pub fn as_matrix<'a, S, D>(x: &'a ArrayBase<S, D>, name: &'static str) -> MMMResult<ArrayView2<'a, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let found = x.ndim();
    x.view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| MMMError::InvalidRank { name, expected: 2, found })
}

/// View `x` as a 3-D tensor or fail with `InvalidRank`.
pub fn as_tensor<'a, S, D>(x: &'a ArrayBase<S, D>, name: &'static str) -> MMMResult<ArrayView3<'a, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let found = x.ndim();
    x.view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| MMMError::InvalidRank { name, expected: 3, found })
}

/// View `x` as a 1-D vector or fail with `InvalidRank`.
pub fn as_vector<'a, S, D>(x: &'a ArrayBase<S, D>, name: &'static str) -> MMMResult<ArrayView1<'a, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let found = x.ndim();
    x.view()
        .into_dimensionality::<Ix1>()
        .map_err(|_| MMMError::InvalidRank { name, expected: 1, found })
}

/// Require one parameter per channel.
pub fn check_channel_count<S>(
    values: &ArrayBase<S, Ix1>, name: &'static str, channels: usize,
) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    if values.len() != channels {
        return Err(MMMError::ChannelMismatch { name, expected: channels, found: values.len() });
    }
    Ok(())
}

/// Every retain rate lies in `[0, 1]`.
pub fn validate_retain_rates<S>(retain_rates: &ArrayBase<S, Ix1>, channels: usize) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    check_channel_count(retain_rates, "retain_rates", channels)?;
    for (index, &value) in retain_rates.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(MMMError::InvalidRetainRate { index, value });
        }
    }
    Ok(())
}

/// Every delay lies in `[0, max_lag]`.
pub fn validate_delays<S>(delays: &ArrayBase<S, Ix1>, channels: usize, max_lag: usize) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    check_channel_count(delays, "delays", channels)?;
    for (index, &value) in delays.iter().enumerate() {
        if !(0.0..=max_lag as f64).contains(&value) {
            return Err(MMMError::InvalidDelay { index, value, max_lag });
        }
    }
    Ok(())
}

/// Every ec lies in `[0, 1]`.
pub fn validate_ecs<S>(ecs: &ArrayBase<S, Ix1>, channels: usize) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    check_channel_count(ecs, "ecs", channels)?;
    for (index, &value) in ecs.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(MMMError::InvalidEc { index, value });
        }
    }
    Ok(())
}

/// Every slope is non-negative.
pub fn validate_slopes<S>(slopes: &ArrayBase<S, Ix1>, channels: usize) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    check_channel_count(slopes, "slopes", channels)?;
    for (index, &value) in slopes.iter().enumerate() {
        if !(value >= 0.0) {
            return Err(MMMError::InvalidSlope { index, value });
        }
    }
    Ok(())
}

/// Every half saturation is non-negative.
pub fn validate_half_saturations<S>(
    half_saturations: &ArrayBase<S, Ix1>, channels: usize,
) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    check_channel_count(half_saturations, "half_saturations", channels)?;
    for (index, &value) in half_saturations.iter().enumerate() {
        if !(value >= 0.0) {
            return Err(MMMError::InvalidHalfSaturation { index, value });
        }
    }
    Ok(())
}

/// Every media coefficient is finite and non-negative.
pub fn validate_beta_medias<S>(beta_medias: &ArrayBase<S, Ix1>) -> MMMResult<()>
where
    S: Data<Elem = f64>,
{
    validate_finite(beta_medias, "beta_medias")?;
    for (index, &value) in beta_medias.iter().enumerate() {
        if !(value >= 0.0) {
            return Err(MMMError::InvalidBeta { index, value });
        }
    }
    Ok(())
}

/// Every entry is finite.
pub fn validate_finite<S, D>(values: &ArrayBase<S, D>, name: &'static str) -> MMMResult<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(MMMError::NonFiniteValue { name, index, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::normalizer::Normalizer;
    use crate::spend_transformation::{expand_lags, logistic_saturation};
    use ndarray::{Array3, ArrayD, IxDyn, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Rank coercion for matrices and tensors.
    // - Length and domain checks of the per-channel validators, including NaN.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure that a 3-D array is rejected where a matrix is expected and
    // that the error reports both ranks.
    //
    // Given
    // -----
    // - A `2×2×2` tensor of zeros.
    //
    // Expect
    // ------
    // - `as_matrix` returns `InvalidRank { expected: 2, found: 3 }`.
    fn as_matrix_rejects_tensor() {
        // Arrange
        let tensor = Array3::<f64>::zeros((2, 2, 2));

        // Act
        let err = as_matrix(&tensor, "spends").unwrap_err();

        // Assert
        assert_eq!(err, MMMError::InvalidRank { name: "spends", expected: 2, found: 3 });
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
    }

    #[test]
    // Purpose
    // -------
    // Verify that retain-rate validation reports the first channel outside
    // `[0, 1]`, and that a wrong length is a shape error.
    //
    // Given
    // -----
    // - `[0.5, 1.2]` for two channels.
    // - `[0.5]` for two channels.
    //
    // Expect
    // ------
    // - `InvalidRetainRate { index: 1, .. }` for the first.
    // - `ChannelMismatch` for the second.
    fn retain_rates_domain_and_length() {
        // Arrange
        let out_of_range = array![0.5, 1.2];
        let short = array![0.5];

        // Act
        let domain_err = validate_retain_rates(&out_of_range, 2).unwrap_err();
        let length_err = validate_retain_rates(&short, 2).unwrap_err();

        // Assert
        assert_eq!(domain_err, MMMError::InvalidRetainRate { index: 1, value: 1.2 });
        assert_eq!(length_err.kind(), ErrorKind::InvalidShape);
    }

    #[test]
    // Purpose
    // -------
    // Confirm that NaN slopes are rejected rather than slipping through a
    // `< 0` comparison.
    //
    // Given
    // -----
    // - `[NaN]` for one channel.
    //
    // Expect
    // ------
    // - `validate_slopes` returns `InvalidSlope` at index 0.
    fn slopes_reject_nan() {
        // Arrange
        let slopes = array![f64::NAN];

        // Act
        let err = validate_slopes(&slopes, 1).unwrap_err();

        // Assert
        assert!(matches!(err, MMMError::InvalidSlope { index: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Rank-erased arrays, as handed over by the Python bindings, are
    // checked by rank at each matrix entry point.
    //
    // Given
    // -----
    // - `IxDyn` arrays of rank 1 and 3, and a `3×2` `IxDyn` matrix.
    //
    // Expect
    // ------
    // - `InvalidRank` with kind `InvalidShape` from `expand_lags`,
    //   `logistic_saturation`, and `Normalizer::fit`; the matrix is
    //   accepted by all three.
    fn dynamic_rank_is_checked_at_entry_points() {
        // Arrange
        let vector = ArrayD::<f64>::zeros(IxDyn(&[3]));
        let cube = ArrayD::<f64>::zeros(IxDyn(&[3, 2, 2]));
        let matrix = array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]].into_dyn();
        let (ecs, slopes) = (array![0.5, 0.5], array![1.0, 1.0]);
        let mut normalizer = Normalizer::default();

        // Act
        let lag_err = expand_lags(&vector, 1).unwrap_err();
        let sat_err = logistic_saturation(&cube, &ecs, &slopes).unwrap_err();
        let fit_err = normalizer.fit(&cube).unwrap_err();

        // Assert
        for err in [&lag_err, &sat_err, &fit_err] {
            assert!(matches!(err, MMMError::InvalidRank { expected: 2, .. }), "got {err:?}");
            assert_eq!(err.kind(), ErrorKind::InvalidShape);
        }
        assert!(expand_lags(&matrix, 2).is_ok());
        assert!(logistic_saturation(&matrix, &ecs, &slopes).is_ok());
        assert!(normalizer.fit(&matrix).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Media coefficients must be finite and non-negative.
    //
    // Given
    // -----
    // - `[0.0, 2.5]`, `[0.4, -1.0]`, `[NaN]`, and `[inf]`.
    //
    // Expect
    // ------
    // - Ok; `InvalidBeta` at index 1; `NonFiniteValue` for the last two.
    fn beta_medias_domain() {
        // Act
        let ok = validate_beta_medias(&array![0.0, 2.5]);
        let negative = validate_beta_medias(&array![0.4, -1.0]).unwrap_err();
        let nan = validate_beta_medias(&array![f64::NAN]).unwrap_err();
        let inf = validate_beta_medias(&array![f64::INFINITY]).unwrap_err();

        // Assert
        assert!(ok.is_ok());
        assert_eq!(negative, MMMError::InvalidBeta { index: 1, value: -1.0 });
        assert_eq!(negative.kind(), ErrorKind::InvalidParameter);
        assert!(matches!(nan, MMMError::NonFiniteValue { name: "beta_medias", .. }));
        assert!(matches!(inf, MMMError::NonFiniteValue { name: "beta_medias", .. }));
    }

    #[test]
    // Purpose
    // -------
    // Check the delay bound is inclusive at `max_lag`.
    //
    // Given
    // -----
    // - `max_lag = 4` and delays `[4.0, 0.0]` then `[4.5, 0.0]`.
    //
    // Expect
    // ------
    // - The first passes, the second fails at channel 0.
    fn delays_upper_bound_is_inclusive() {
        // Arrange
        let at_bound = array![4.0, 0.0];
        let beyond = array![4.5, 0.0];

        // Act / Assert
        assert!(validate_delays(&at_bound, 2, 4).is_ok());
        assert!(matches!(
            validate_delays(&beyond, 2, 4),
            Err(MMMError::InvalidDelay { index: 0, max_lag: 4, .. })
        ));
    }
}
