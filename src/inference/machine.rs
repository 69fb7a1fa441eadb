//! Inference machine: predictions and contributions from a fitted parameter set.
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, ArrayView3, ArrayViewD, Axis, Data, Dimension, s};
use std::collections::BTreeMap;

use super::params::{CarryoverParams, ParameterSet};
use crate::{
    errors::{MMMError, MMMResult},
    spend_transformation::expand_lags,
    validation::{as_matrix, validate_delays},
};

/// InferenceMachine — the fitted transform pipeline outside the sampler.
///
/// Purpose
/// -------
/// Re-run lag expansion, carryover, and saturation with point-estimated
/// parameters, then combine the transformed channels with `beta_medias`,
/// `tau`, and optionally control variables weighted by `gamma_ctrl`.
///
/// Key behaviors
/// -------------
/// - Kernel selection is fixed by the variants of the stored
///   [`ParameterSet`]; nothing is probed at prediction time.
/// - [`InferenceMachine::predict`] and [`InferenceMachine::contributions`]
///   share one pipeline, so the contribution columns sum to the prediction.
///
/// Invariants
/// ----------
/// - `max_lag ≥ 1`.
/// - For peaked decay every delay lies in `[0, max_lag]`.
///
/// Notes
/// -----
/// - Outputs are on the normalized target scale; apply the target
///   normalizer's `reverse_transform` for natural units.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceMachine {
    params: ParameterSet,
    max_lag: usize,
}

impl InferenceMachine {
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` if `max_lag == 0`.
    /// - `MMMError::InvalidDelay` if a delay exceeds `max_lag`.
    pub fn new(params: ParameterSet, max_lag: usize) -> MMMResult<Self> {
        if max_lag == 0 {
            return Err(MMMError::InvalidSetting { field: "max_lag", reason: "must be at least 1" });
        }
        if let CarryoverParams::PeakedDecay { delays, .. } = params.carryover() {
            validate_delays(delays, params.channels(), max_lag)?;
        }
        Ok(InferenceMachine { params, max_lag })
    }

    /// Build the machine from named point estimates; see
    /// [`ParameterSet::from_named`].
    pub fn from_named(
        named: &BTreeMap<String, ndarray::ArrayD<f64>>, max_lag: usize,
    ) -> MMMResult<Self> {
        InferenceMachine::new(ParameterSet::from_named(named)?, max_lag)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// predict — normalized-scale prediction per observation.
    ///
    /// Parameters
    /// ----------
    /// - `spends`: rank-2 spend matrix `(time, channel)`; `time ≥ max_lag`.
    /// - `ctrl`: optional rank-2 control matrix `(time, control)`. Ignored
    ///   terms are not allowed: supplying it to a parameter set without
    ///   `gamma_ctrl` is an error. Omitting it drops the control term.
    ///
    /// Returns
    /// -------
    /// `MMMResult<Array1<f64>>` of length `time`:
    /// `Σ_c sat(carry(lags))[t, c]·β_c + τ (+ Σ_k ctrl[t, k]·γ_k)`.
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidRank` for a wrong-rank `spends` or `ctrl`.
    /// - `MMMError::ChannelMismatch` if `spends` has the wrong width.
    /// - `MMMError::MaxLagOutOfRange` if `time < max_lag`.
    /// - `MMMError::ControlMismatch`, `MMMError::ColumnMismatch`,
    ///   `MMMError::RowMismatch` for inconsistent controls.
    pub fn predict<S, D>(
        &self, spends: &ArrayBase<S, D>, ctrl: Option<ArrayViewD<'_, f64>>,
    ) -> MMMResult<Array1<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let lagged = self.lag(spends)?;
        let ctrl = self.check_controls(ctrl, lagged.dim().0)?;
        self.predict_lagged(lagged.view(), ctrl)
    }

    /// contributions — per-contributor decomposition of [`predict`](Self::predict).
    ///
    /// Returns
    /// -------
    /// `MMMResult<Array2<f64>>` of shape `(time, channels + controls + 1)`:
    /// one column per channel (`sat·β_c`), one per supplied control
    /// (`ctrl·γ_k`), and a final constant `τ` column. Row sums equal
    /// `predict` up to floating-point reassociation.
    ///
    /// Errors
    /// ------
    /// - As [`predict`](Self::predict).
    pub fn contributions<S, D>(
        &self, spends: &ArrayBase<S, D>, ctrl: Option<ArrayViewD<'_, f64>>,
    ) -> MMMResult<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let lagged = self.lag(spends)?;
        let rows = lagged.dim().0;
        let ctrl = self.check_controls(ctrl, rows)?;
        let media = self.params.transform_lagged(lagged.view())? * self.params.beta_medias();
        let channels = media.ncols();
        let n_ctrl = ctrl.as_ref().map_or(0, |(c, _)| c.ncols());

        let mut out = Array2::<f64>::zeros((rows, channels + n_ctrl + 1));
        out.slice_mut(s![.., ..channels]).assign(&media);
        if let Some((ctrl, gamma)) = ctrl {
            out.slice_mut(s![.., channels..channels + n_ctrl]).assign(&(&ctrl * gamma));
        }
        out.column_mut(channels + n_ctrl).fill(self.params.tau());
        Ok(out)
    }

    /// Prediction on an already lagged tensor with checked controls.
    pub(crate) fn predict_lagged(
        &self, lagged: ArrayView3<'_, f64>, ctrl: Option<(ArrayView2<'_, f64>, &Array1<f64>)>,
    ) -> MMMResult<Array1<f64>> {
        let transformed = self.params.transform_lagged(lagged)?;
        let mut mean = transformed.dot(self.params.beta_medias()) + self.params.tau();
        if let Some((ctrl, gamma)) = ctrl {
            mean += &ctrl.dot(gamma);
        }
        Ok(mean)
    }

    fn lag<S, D>(&self, spends: &ArrayBase<S, D>) -> MMMResult<ndarray::Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let spends = as_matrix(spends, "spends")?;
        if spends.ncols() != self.params.channels() {
            return Err(MMMError::ChannelMismatch {
                name: "spends",
                expected: self.params.channels(),
                found: spends.ncols(),
            });
        }
        expand_lags(&spends, self.max_lag)
    }

    /// Pair the control matrix with `gamma_ctrl` after checking both agree.
    fn check_controls<'c, 'v>(
        &'c self, ctrl: Option<ArrayViewD<'v, f64>>, rows: usize,
    ) -> MMMResult<Option<(ArrayView2<'v, f64>, &'c Array1<f64>)>> {
        let Some(ctrl) = ctrl else { return Ok(None) };
        let gamma = self.params.gamma_ctrl().ok_or(MMMError::ControlMismatch {
            reason: "control variables supplied but the parameter set has no gamma_ctrl",
        })?;
        let found = ctrl.ndim();
        let ctrl = ctrl
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| MMMError::InvalidRank { name: "ctrl_vars", expected: 2, found })?;
        if ctrl.ncols() != gamma.len() {
            return Err(MMMError::ColumnMismatch { expected: gamma.len(), found: ctrl.ncols() });
        }
        if ctrl.nrows() != rows {
            return Err(MMMError::RowMismatch { name: "ctrl_vars", expected: rows, found: ctrl.nrows() });
        }
        Ok(Some((ctrl, gamma)))
    }
}

/// Row sums of a contribution matrix.
pub fn total_contribution(contributions: &Array2<f64>) -> Array1<f64> {
    contributions.sum_axis(Axis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::inference::params::SaturationParams;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reference predictions for all eight (carryover × saturation ×
    //   controls) combinations.
    // - The contribution sum invariant.
    // - Control and shape mismatches.
    // -------------------------------------------------------------------------

    fn spends() -> Array2<f64> {
        array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]]
    }

    fn ctrl() -> Array2<f64> {
        array![[2.0, 4.0], [5.0, 2.0], [6.0, 4.0], [7.0, 2.0]]
    }

    fn params(peaked: bool, logistic: bool, controls: bool) -> ParameterSet {
        let retain_rates = array![0.2, 0.9];
        let carryover = if peaked {
            CarryoverParams::PeakedDecay { retain_rates, delays: array![1.5, 1.0] }
        } else {
            CarryoverParams::GeometricDecay { retain_rates }
        };
        let saturation = if logistic {
            SaturationParams::Logistic { ecs: array![0.2, 1.0], slopes: array![1.0, 4.0] }
        } else {
            SaturationParams::Reach { half_saturations: array![2.0, 3.0] }
        };
        let gamma = controls.then(|| array![0.5, 1.0]);
        ParameterSet::new(carryover, saturation, array![0.2, 0.4], gamma, 2.0).unwrap()
    }

    fn cases() -> Vec<(bool, bool, bool, usize, [f64; 4])> {
        vec![
            (true, true, true, 2, [7.531529, 7.095915, 9.432255, 8.070454]),
            (true, true, false, 3, [2.498776, 2.592115, 2.592187, 2.549253]),
            (true, false, true, 2, [7.473342, 7.100000, 9.407689, 8.063805]),
            (true, false, false, 3, [2.438721, 2.599978, 2.599979, 2.505725]),
            (false, true, true, 2, [7.595280, 7.078560, 9.561288, 8.091176]),
            (false, true, false, 3, [2.595025, 2.577889, 2.569900, 2.590895]),
            (false, false, true, 2, [7.600000, 7.086222, 9.536452, 8.099931]),
            (false, false, false, 3, [2.600000, 2.584718, 2.562138, 2.599909]),
        ]
    }

    #[test]
    // Purpose
    // -------
    // Predictions match reference values for every model structure.
    //
    // Given
    // -----
    // - The shared spend and control fixtures.
    // - Eight parameter sets and their `max_lag`.
    //
    // Expect
    // ------
    // - Agreement with the reference vectors within 1e-6.
    fn predict_matches_reference_vectors() {
        let (spends, ctrl) = (spends(), ctrl());
        for (peaked, logistic, controls, max_lag, expected) in cases() {
            // Arrange
            let machine = InferenceMachine::new(params(peaked, logistic, controls), max_lag).unwrap();
            let ctrl_view = controls.then(|| ctrl.view().into_dyn());

            // Act
            let pred = machine.predict(&spends, ctrl_view).unwrap();

            // Assert
            for (p, e) in pred.iter().zip(expected) {
                assert_relative_eq!(*p, e, epsilon = 1e-6);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Contribution columns sum to the prediction.
    //
    // Given
    // -----
    // - The same eight configurations.
    //
    // Expect
    // ------
    // - `(media + ctrl + 1)` columns; row sums equal `predict` within 1e-6;
    //   the last column is `tau`.
    fn contributions_sum_to_prediction() {
        let (spends, ctrl) = (spends(), ctrl());
        for (peaked, logistic, controls, max_lag, _) in cases() {
            // Arrange
            let machine = InferenceMachine::new(params(peaked, logistic, controls), max_lag).unwrap();
            let ctrl_view = || controls.then(|| ctrl.view().into_dyn());

            // Act
            let pred = machine.predict(&spends, ctrl_view()).unwrap();
            let contrib = machine.contributions(&spends, ctrl_view()).unwrap();

            // Assert
            let n_ctrl = if controls { 2 } else { 0 };
            assert_eq!(contrib.ncols(), 2 + n_ctrl + 1);
            for (total, p) in total_contribution(&contrib).iter().zip(pred.iter()) {
                assert_relative_eq!(*total, *p, epsilon = 1e-6);
            }
            assert!(contrib.column(contrib.ncols() - 1).iter().all(|&v| v == 2.0));
        }
    }

    #[test]
    // Purpose
    // -------
    // Controls must agree with `gamma_ctrl`.
    //
    // Given
    // -----
    // - Controls passed to a set without `gamma_ctrl`.
    // - Three control columns for two coefficients.
    // - Three control rows for four spend rows.
    // - A rank-1 control array.
    //
    // Expect
    // ------
    // - `ControlMismatch`, `ColumnMismatch`, `RowMismatch`, `InvalidRank`.
    fn control_mismatches_are_rejected() {
        // Arrange
        let spends = spends();
        let plain = InferenceMachine::new(params(false, false, false), 2).unwrap();
        let with = InferenceMachine::new(params(false, false, true), 2).unwrap();
        let wide = Array2::<f64>::zeros((4, 3));
        let short = Array2::<f64>::zeros((3, 2));
        let flat = array![1.0, 2.0, 3.0, 4.0];

        // Act
        let e_none = plain.predict(&spends, Some(ctrl().view().into_dyn())).unwrap_err();
        let e_cols = with.predict(&spends, Some(wide.view().into_dyn())).unwrap_err();
        let e_rows = with.predict(&spends, Some(short.view().into_dyn())).unwrap_err();
        let e_rank = with.predict(&spends, Some(flat.view().into_dyn())).unwrap_err();

        // Assert
        assert!(matches!(e_none, MMMError::ControlMismatch { .. }));
        assert_eq!(e_cols, MMMError::ColumnMismatch { expected: 2, found: 3 });
        assert_eq!(e_rows, MMMError::RowMismatch { name: "ctrl_vars", expected: 4, found: 3 });
        assert_eq!(e_rank.kind(), ErrorKind::InvalidShape);
    }

    #[test]
    // Purpose
    // -------
    // Control views may be borrowed for a shorter scope than the machine.
    //
    // Given
    // -----
    // - A machine built before the control matrix exists.
    // - Controls created and dropped inside an inner block.
    //
    // Expect
    // ------
    // - `predict` and `contributions` succeed, and the machine stays usable
    //   afterwards.
    fn controls_outlived_by_machine() {
        // Arrange
        let spends = spends();
        let machine = InferenceMachine::new(params(false, false, true), 2).unwrap();

        // Act
        let (pred, contrib) = {
            let local = ctrl();
            let view = local.view().into_dyn();
            let pred = machine.predict(&spends, Some(view.clone())).unwrap();
            let contrib = machine.contributions(&spends, Some(view)).unwrap();
            (pred, contrib)
        };
        let again = machine.predict(&spends, Some(ctrl().view().into_dyn())).unwrap();

        // Assert
        assert_eq!(pred, again);
        for (total, p) in total_contribution(&contrib).iter().zip(pred.iter()) {
            assert_relative_eq!(*total, *p, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // Construction rejects structural errors before any prediction.
    //
    // Given
    // -----
    // - `max_lag = 0`.
    // - Peaked delays `[1.5, 1]` with `max_lag = 1`.
    // - A three-channel spend matrix for a two-channel model.
    //
    // Expect
    // ------
    // - `InvalidSetting`, `InvalidDelay`, `ChannelMismatch`.
    fn structural_errors_are_rejected() {
        // Act
        let zero = InferenceMachine::new(params(false, true, false), 0).unwrap_err();
        let delay = InferenceMachine::new(params(true, true, false), 1).unwrap_err();
        let machine = InferenceMachine::new(params(false, true, false), 2).unwrap();
        let width = machine.predict(&Array2::<f64>::ones((4, 3)), None).unwrap_err();

        // Assert
        assert!(matches!(zero, MMMError::InvalidSetting { field: "max_lag", .. }));
        assert_eq!(delay, MMMError::InvalidDelay { index: 0, value: 1.5, max_lag: 1 });
        assert!(matches!(width, MMMError::ChannelMismatch { name: "spends", .. }));
    }
}
