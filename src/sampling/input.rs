//! Data handed to the sampling runtime.
use ndarray::{Array1, Array2, Array3, ArrayBase, Data, Dimension};
use serde_json::{Value, json};

use crate::{
    errors::{MMMError, MMMResult},
    spend_transformation::expand_lags,
    validation::{as_matrix, as_vector, validate_finite},
};

/// SamplerInput — the data block of the generated program.
///
/// Purpose
/// -------
/// Hold exactly the values the `data { ... }` section declares:
/// `N, Y, max_lag, num_media, X_media` and, when controls are present,
/// `num_ctrl, X_ctrl`. The lagged media tensor is built once here and shared
/// by the sampler and the posterior-mode estimator.
///
/// Invariants
/// ----------
/// - `x_media` has shape `(N, num_media, max_lag)`; `y` has length `N`.
/// - `x_ctrl`, when present, has `N` rows and at least one column.
/// - `y` is finite and non-negative (the program declares `real<lower=0>`).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerInput {
    y: Array1<f64>,
    x_media: Array3<f64>,
    x_ctrl: Option<Array2<f64>>,
}

impl SamplerInput {
    /// Build the data block from raw spends, optional controls, and the
    /// (normalized) target.
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidRank` for wrong-rank inputs.
    /// - `MMMError::InvalidSetting` if `max_lag == 0`, a matrix has no
    ///   columns, or the target is negative.
    /// - `MMMError::MaxLagOutOfRange` if `max_lag` exceeds the rows.
    /// - `MMMError::RowMismatch` if the inputs disagree on the rows.
    /// - `MMMError::NonFiniteValue` for NaN or infinite entries.
    pub fn new<S, D, C, E, T, F>(
        spends: &ArrayBase<S, D>, ctrl: Option<&ArrayBase<C, E>>, target: &ArrayBase<T, F>,
        max_lag: usize,
    ) -> MMMResult<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
        C: Data<Elem = f64>,
        E: Dimension,
        T: Data<Elem = f64>,
        F: Dimension,
    {
        if max_lag == 0 {
            return Err(MMMError::InvalidSetting { field: "max_lag", reason: "must be at least 1" });
        }
        let spends = as_matrix(spends, "spends")?;
        let y = as_vector(target, "target")?;
        let rows = spends.nrows();
        if spends.ncols() == 0 {
            return Err(MMMError::InvalidSetting { field: "spends", reason: "needs at least one channel" });
        }
        if y.len() != rows {
            return Err(MMMError::RowMismatch { name: "target", expected: rows, found: y.len() });
        }
        validate_finite(&spends, "spends")?;
        validate_finite(&y, "target")?;
        if y.iter().any(|&v| v < 0.0) {
            return Err(MMMError::InvalidSetting { field: "target", reason: "must be non-negative" });
        }

        let x_ctrl = match ctrl {
            Some(c) => {
                let c = as_matrix(c, "ctrl_vars")?;
                if c.nrows() != rows {
                    return Err(MMMError::RowMismatch { name: "ctrl_vars", expected: rows, found: c.nrows() });
                }
                if c.ncols() == 0 {
                    return Err(MMMError::InvalidSetting {
                        field: "ctrl_vars",
                        reason: "needs at least one column",
                    });
                }
                validate_finite(&c, "ctrl_vars")?;
                Some(c.to_owned())
            }
            None => None,
        };

        Ok(SamplerInput { y: y.to_owned(), x_media: expand_lags(&spends, max_lag)?, x_ctrl })
    }

    /// `N`.
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn max_lag(&self) -> usize {
        self.x_media.dim().2
    }

    pub fn num_media(&self) -> usize {
        self.x_media.dim().1
    }

    pub fn num_ctrl(&self) -> Option<usize> {
        self.x_ctrl.as_ref().map(|c| c.ncols())
    }

    pub fn has_controls(&self) -> bool {
        self.x_ctrl.is_some()
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn x_media(&self) -> &Array3<f64> {
        &self.x_media
    }

    pub fn x_ctrl(&self) -> Option<&Array2<f64>> {
        self.x_ctrl.as_ref()
    }

    /// Data names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec!["N", "Y", "max_lag", "num_media", "X_media"];
        if self.has_controls() {
            names.extend(["num_ctrl", "X_ctrl"]);
        }
        names
    }

    /// The data block as a CmdStan JSON document.
    pub fn to_stan_json(&self) -> Value {
        let x_media: Vec<Vec<Vec<f64>>> = self
            .x_media
            .outer_iter()
            .map(|obs| obs.outer_iter().map(|lags| lags.to_vec()).collect())
            .collect();
        let mut doc = json!({
            "N": self.n_obs(),
            "Y": self.y.to_vec(),
            "max_lag": self.max_lag(),
            "num_media": self.num_media(),
            "X_media": x_media,
        });
        if let (Some(ctrl), Value::Object(map)) = (&self.x_ctrl, &mut doc) {
            let rows: Vec<Vec<f64>> = ctrl.outer_iter().map(|r| r.to_vec()).collect();
            map.insert("num_ctrl".into(), json!(ctrl.ncols()));
            map.insert("X_ctrl".into(), json!(rows));
        }
        doc
    }
}
