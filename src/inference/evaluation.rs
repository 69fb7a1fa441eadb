//! Train/test evaluation on the natural target scale.
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Dimension, Ix1, Slice};
use serde::Serialize;

use super::machine::InferenceMachine;
use crate::{
    errors::{MMMError, MMMResult},
    normalizer::Normalizer,
};

/// Mean absolute percentage error, in percent.
///
/// `mean(|truth - pred| / truth) · 100`. The denominator keeps its sign,
/// so negative truth values contribute negative terms. A zero truth value
/// yields an infinite (or NaN) error rather than a failure.
///
/// Errors
/// ------
/// - `MMMError::RowMismatch` if the lengths differ.
/// - `MMMError::InvalidSetting` for empty input.
pub fn mape<S, T>(truth: &ArrayBase<S, Ix1>, pred: &ArrayBase<T, Ix1>) -> MMMResult<f64>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    if truth.len() != pred.len() {
        return Err(MMMError::RowMismatch { name: "predictions", expected: truth.len(), found: pred.len() });
    }
    if truth.is_empty() {
        return Err(MMMError::InvalidSetting { field: "truth", reason: "must not be empty" });
    }
    let total: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).abs() / t).sum();
    Ok(total / truth.len() as f64 * 100.0)
}

/// Split `values` along its leading axis into `(train, test)`, with the last
/// `n_test` rows held out.
///
/// Errors
/// ------
/// - `MMMError::InvalidSetting` unless `1 ≤ n_test < rows`.
pub fn split_train_test<S, D>(
    values: &ArrayBase<S, D>, n_test: usize,
) -> MMMResult<(Array<f64, D>, Array<f64, D>)>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let rows = values.len_of(Axis(0));
    if n_test == 0 || n_test >= rows {
        return Err(MMMError::InvalidSetting {
            field: "n_test",
            reason: "must lie in [1, number of observations)",
        });
    }
    let cut = (rows - n_test) as isize;
    let train = values.slice_axis(Axis(0), Slice::from(..cut)).to_owned();
    let test = values.slice_axis(Axis(0), Slice::from(cut..)).to_owned();
    Ok((train, test))
}

/// Aligned spends, optional controls, and normalized target.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    pub spends: Array2<f64>,
    pub ctrl: Option<Array2<f64>>,
    pub target: Array1<f64>,
}

impl ObservationSet {
    /// Errors
    /// ------
    /// - `MMMError::RowMismatch` if `ctrl` or `target` disagree with
    ///   `spends` on the number of rows.
    pub fn new(spends: Array2<f64>, ctrl: Option<Array2<f64>>, target: Array1<f64>) -> MMMResult<Self> {
        let rows = spends.nrows();
        if let Some(c) = &ctrl {
            if c.nrows() != rows {
                return Err(MMMError::RowMismatch { name: "ctrl_vars", expected: rows, found: c.nrows() });
            }
        }
        if target.len() != rows {
            return Err(MMMError::RowMismatch { name: "target", expected: rows, found: target.len() });
        }
        Ok(ObservationSet { spends, ctrl, target })
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Hold out the last `n_test` observations.
    pub fn split(&self, n_test: usize) -> MMMResult<(ObservationSet, ObservationSet)> {
        let (spends_train, spends_test) = split_train_test(&self.spends, n_test)?;
        let (target_train, target_test) = split_train_test(&self.target, n_test)?;
        let (ctrl_train, ctrl_test) = match &self.ctrl {
            Some(c) => {
                let (a, b) = split_train_test(c, n_test)?;
                (Some(a), Some(b))
            }
            None => (None, None),
        };
        Ok((
            ObservationSet { spends: spends_train, ctrl: ctrl_train, target: target_train },
            ObservationSet { spends: spends_test, ctrl: ctrl_test, target: target_test },
        ))
    }
}

/// MAPE on each split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Performance {
    pub train: f64,
    pub test: f64,
}

/// Natural-scale truth and predictions of one split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    pub truth: Array1<f64>,
    pub predictions: Array1<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub performance: Performance,
    pub train: SplitResult,
    pub test: SplitResult,
}

/// Evaluator — MAPE of a fitted machine on the natural target scale.
///
/// Each split is predicted on its own, so the test split starts with a fresh
/// (zero-padded) lag history.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    machine: &'a InferenceMachine,
    target_normalizer: &'a Normalizer,
}

impl<'a> Evaluator<'a> {
    pub fn new(machine: &'a InferenceMachine, target_normalizer: &'a Normalizer) -> Self {
        Evaluator { machine, target_normalizer }
    }

    /// Errors
    /// ------
    /// - Any prediction error of [`InferenceMachine::predict`].
    /// - `MMMError::NotFitted` if the target normalizer was never fitted.
    pub fn evaluate(&self, train: &ObservationSet, test: &ObservationSet) -> MMMResult<Evaluation> {
        let train = self.split_result(train)?;
        let test = self.split_result(test)?;
        let performance = Performance {
            train: mape(&train.truth, &train.predictions)?,
            test: mape(&test.truth, &test.predictions)?,
        };
        Ok(Evaluation { performance, train, test })
    }

    fn split_result(&self, obs: &ObservationSet) -> MMMResult<SplitResult> {
        let pred = self.machine.predict(&obs.spends, obs.ctrl.as_ref().map(|c| c.view().into_dyn()))?;
        Ok(SplitResult { truth: self.denormalize(&obs.target)?, predictions: self.denormalize(&pred)? })
    }

    fn denormalize(&self, values: &Array1<f64>) -> MMMResult<Array1<f64>> {
        let column = values.view().insert_axis(Axis(1));
        let natural = self.target_normalizer.reverse_transform(&column)?;
        Ok(natural.column(0).to_owned())
    }
}
