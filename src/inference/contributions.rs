//! Named contribution tables, optionally on the natural target scale.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayViewD, Axis, Data, Dimension};
use serde::Serialize;

use super::machine::InferenceMachine;
use crate::{
    errors::{MMMError, MMMResult},
    normalizer::Normalizer,
};

/// Column name of the constant `tau` contribution.
pub const BASELINE: &str = "baseline";

/// Contributions with one named column per media channel, control variable,
/// and the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionTable {
    names: Vec<String>,
    values: Array2<f64>,
}

impl ContributionTable {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Column by name, or `None` if no contributor has that name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names.iter().position(|n| n == name).map(|j| self.values.column(j))
    }

    /// Sum of every contributor per observation.
    pub fn totals(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(1))
    }
}

/// ContributionCalculator — contribution decomposition with names and scale.
///
/// Purpose
/// -------
/// Label the columns of [`InferenceMachine::contributions`] and, when a
/// fitted target normalizer is supplied, map each column back to the target's
/// natural scale.
///
/// Notes
/// -----
/// - Denormalization applies the single-column target statistics to every
///   contribution column independently. With a non-identity value transform
///   the denormalized columns no longer sum to the denormalized prediction.
#[derive(Debug, Clone)]
pub struct ContributionCalculator<'a> {
    machine: &'a InferenceMachine,
    target_normalizer: Option<&'a Normalizer>,
    media_names: Vec<String>,
    ctrl_names: Vec<String>,
}

impl<'a> ContributionCalculator<'a> {
    /// Errors
    /// ------
    /// - `MMMError::ChannelMismatch` if `media_names` does not name every
    ///   channel, or `ctrl_names` does not name every `gamma_ctrl` entry.
    pub fn new(
        machine: &'a InferenceMachine, media_names: Vec<String>, ctrl_names: Vec<String>,
    ) -> MMMResult<Self> {
        let channels = machine.params().channels();
        if media_names.len() != channels {
            return Err(MMMError::ChannelMismatch {
                name: "media_names",
                expected: channels,
                found: media_names.len(),
            });
        }
        let n_ctrl = machine.params().gamma_ctrl().map_or(0, |g| g.len());
        if ctrl_names.len() != n_ctrl {
            return Err(MMMError::ChannelMismatch {
                name: "ctrl_names",
                expected: n_ctrl,
                found: ctrl_names.len(),
            });
        }
        Ok(ContributionCalculator { machine, target_normalizer: None, media_names, ctrl_names })
    }

    /// Denormalize every column with `normalizer`.
    pub fn with_target_normalizer(mut self, normalizer: &'a Normalizer) -> Self {
        self.target_normalizer = Some(normalizer);
        self
    }

    /// Errors
    /// ------
    /// - Any error of [`InferenceMachine::contributions`].
    /// - `MMMError::NotFitted` / `MMMError::ColumnMismatch` from the target
    ///   normalizer.
    pub fn compute<S, D>(
        &self, spends: &ArrayBase<S, D>, ctrl: Option<ArrayViewD<'_, f64>>,
    ) -> MMMResult<ContributionTable>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let with_ctrl = ctrl.is_some();
        let raw = self.machine.contributions(spends, ctrl)?;
        let values = match self.target_normalizer {
            Some(normalizer) => normalizer.reverse_transform(&raw)?,
            None => raw,
        };

        let mut names = self.media_names.clone();
        if with_ctrl {
            names.extend(self.ctrl_names.iter().cloned());
        }
        names.push(BASELINE.to_string());
        Ok(ContributionTable { names, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::params::{CarryoverParams, ParameterSet, SaturationParams};
    use crate::normalizer::{ScalerKind, ValueTransform};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Column naming with and without controls.
    // - Denormalization with an identity-transform target normalizer.
    // - Name-count validation.
    // -------------------------------------------------------------------------

    fn machine() -> InferenceMachine {
        let params = ParameterSet::new(
            CarryoverParams::GeometricDecay { retain_rates: array![0.2, 0.9] },
            SaturationParams::Reach { half_saturations: array![2.0, 3.0] },
            array![0.2, 0.4],
            Some(array![0.5, 1.0]),
            2.0,
        )
        .unwrap();
        InferenceMachine::new(params, 2).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    // Purpose
    // -------
    // Columns are named media first, then controls, then the baseline.
    //
    // Given
    // -----
    // - Two channels and two controls, called with controls.
    //
    // Expect
    // ------
    // - Names `[tv, radio, price, season, baseline]`; the baseline column
    //   is constant `tau`; totals match `predict`.
    fn table_is_named_in_contributor_order() {
        // Arrange
        let machine = machine();
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];
        let ctrl = array![[2.0, 4.0], [5.0, 2.0], [6.0, 4.0], [7.0, 2.0]];
        let calc =
            ContributionCalculator::new(&machine, names(&["tv", "radio"]), names(&["price", "season"]))
                .unwrap();

        // Act
        let table = calc.compute(&spends, Some(ctrl.view().into_dyn())).unwrap();
        let pred = machine.predict(&spends, Some(ctrl.view().into_dyn())).unwrap();

        // Assert
        assert_eq!(table.names(), names(&["tv", "radio", "price", "season", "baseline"]).as_slice());
        assert!(table.column(BASELINE).unwrap().iter().all(|&v| v == 2.0));
        assert!(table.column("missing").is_none());
        for (t, p) in table.totals().iter().zip(pred.iter()) {
            assert_relative_eq!(*t, *p, epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // A fitted target normalizer rescales every column with the target's
    // statistics.
    //
    // Given
    // -----
    // - An identity/max-abs normalizer fitted on a target with max |y| = 10.
    //
    // Expect
    // ------
    // - Each denormalized entry is 10× the raw contribution; without
    //   controls the table has no control columns.
    fn target_normalizer_rescales_columns() {
        // Arrange
        let machine = machine();
        let spends = array![[10.0, 20.0], [0.0, 8.0], [1.0, 30.0], [5.0, 40.0]];
        let mut normalizer = Normalizer::new(ValueTransform::Identity, ScalerKind::MaxAbs);
        normalizer.fit(&array![[2.0], [-10.0], [4.0]]).unwrap();
        let calc = ContributionCalculator::new(&machine, names(&["tv", "radio"]), names(&["a", "b"]))
            .unwrap()
            .with_target_normalizer(&normalizer);

        // Act
        let table = calc.compute(&spends, None).unwrap();
        let raw = machine.contributions(&spends, None).unwrap();

        // Assert
        assert_eq!(table.names(), names(&["tv", "radio", "baseline"]).as_slice());
        for (d, r) in table.values().iter().zip(raw.iter()) {
            assert_relative_eq!(*d, 10.0 * r, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Name lists must cover every contributor.
    //
    // Given
    // -----
    // - One media name for two channels; no control names for two controls.
    //
    // Expect
    // ------
    // - `ChannelMismatch` naming the offending list.
    fn name_counts_are_checked() {
        // Arrange
        let machine = machine();

        // Act
        let media = ContributionCalculator::new(&machine, names(&["tv"]), names(&["a", "b"])).unwrap_err();
        let ctrl = ContributionCalculator::new(&machine, names(&["tv", "radio"]), vec![]).unwrap_err();

        // Assert
        assert!(matches!(media, MMMError::ChannelMismatch { name: "media_names", .. }));
        assert!(matches!(ctrl, MMMError::ChannelMismatch { name: "ctrl_names", .. }));
    }
}
