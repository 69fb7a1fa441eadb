use ndarray::{Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{MMMError, MMMResult},
    normalizer::{
        scaler::{FittedScaler, ScalerKind},
        transform::ValueTransform,
    },
    validation::as_matrix,
};

/// Lifecycle of a [`Normalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NormalizerState {
    Unfitted,
    Fitted { scaler: FittedScaler },
}

/// Normalizer — invertible value transform followed by a fitted rescaler.
///
/// Purpose
/// -------
/// Bring spend, control, and target columns onto a comparable `[0, 1]`-ish
/// scale before sampling, and map model outputs back to natural units
/// afterwards.
///
/// Key behaviors
/// -------------
/// - [`Normalizer::fit`] applies the value transform and fits per-column
///   scaler statistics, moving the state to `Fitted`.
/// - [`Normalizer::transform`] applies transform then scaling.
/// - [`Normalizer::reverse_transform`] undoes scaling, then the transform.
///
/// Invariants
/// ----------
/// - `transform`/`reverse_transform` fail with `NotFitted` while the state
///   is `Unfitted`.
/// - A failed `fit` leaves the previous state untouched; a successful `fit`
///   replaces it entirely.
/// - With the `log` transform, negative inputs are rejected by `fit` and
///   `transform`.
///
/// Notes
/// -----
/// - `reverse_transform` also accepts any column count when the normalizer
///   was fitted on a single column; the single column's statistics then
///   apply to every column. This is how per-contributor tables on the
///   target scale are denormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    transform: ValueTransform,
    scaler: ScalerKind,
    state: NormalizerState,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(ValueTransform::default(), ScalerKind::default())
    }
}

impl Normalizer {
    pub fn new(transform: ValueTransform, scaler: ScalerKind) -> Self {
        Normalizer { transform, scaler, state: NormalizerState::Unfitted }
    }

    /// Build an unfitted normalizer from configuration names.
    ///
    /// Errors
    /// ------
    /// - `MMMError::UnknownTransform` / `MMMError::UnknownScaler` for names
    ///   outside `{log, sqrt, none}` / `{min_max, max_abs}`.
    pub fn from_names(transform: Option<&str>, scaler: &str) -> MMMResult<Self> {
        let transform = ValueTransform::from_name(transform)?;
        let scaler = scaler.parse::<ScalerKind>()?;
        Ok(Normalizer::new(transform, scaler))
    }

    pub fn value_transform(&self) -> ValueTransform {
        self.transform
    }

    pub fn scaler_kind(&self) -> ScalerKind {
        self.scaler
    }

    pub fn state(&self) -> &NormalizerState {
        &self.state
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, NormalizerState::Fitted { .. })
    }

    /// Fit scaler statistics on `values` (rank 2).
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidRank` if `values` is not a matrix.
    /// - `MMMError::NegativeLogInput` for negative entries under `log`.
    pub fn fit<S, D>(&mut self, values: &ArrayBase<S, D>) -> MMMResult<()>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let values = as_matrix(values, "values")?;
        let transformed = self.forward(values)?;
        let scaler = self.scaler.fit(transformed.view());
        self.state = NormalizerState::Fitted { scaler };
        Ok(())
    }

    /// Apply the forward transform and the fitted scaling.
    ///
    /// Errors
    /// ------
    /// - `MMMError::NotFitted` before `fit`.
    /// - `MMMError::InvalidRank`, `MMMError::ColumnMismatch`,
    ///   `MMMError::NegativeLogInput`.
    pub fn transform<S, D>(&self, values: &ArrayBase<S, D>) -> MMMResult<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let scaler = self.fitted()?;
        let values = as_matrix(values, "values")?;
        if values.ncols() != scaler.n_columns() {
            return Err(MMMError::ColumnMismatch {
                expected: scaler.n_columns(),
                found: values.ncols(),
            });
        }
        let mut out = self.forward(values)?;
        scaler.scale_inplace(&mut out);
        Ok(out)
    }

    /// Undo the scaling, then the value transform.
    ///
    /// Errors
    /// ------
    /// - `MMMError::NotFitted` before `fit`.
    /// - `MMMError::InvalidRank` if `values` is not a matrix.
    /// - `MMMError::ColumnMismatch` if the column count differs from the
    ///   fitted one and the normalizer was fitted on more than one column.
    pub fn reverse_transform<S, D>(&self, values: &ArrayBase<S, D>) -> MMMResult<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let scaler = self.fitted()?;
        let values = as_matrix(values, "normalized_values")?;
        let fitted_cols = scaler.n_columns();
        if fitted_cols != 1 && values.ncols() != fitted_cols {
            return Err(MMMError::ColumnMismatch { expected: fitted_cols, found: values.ncols() });
        }
        let mut out = values.to_owned();
        scaler.unscale_inplace(&mut out);
        let transform = self.transform;
        out.mapv_inplace(|x| transform.inverse(x));
        Ok(out)
    }

    fn fitted(&self) -> MMMResult<&FittedScaler> {
        match &self.state {
            NormalizerState::Fitted { scaler } => Ok(scaler),
            NormalizerState::Unfitted => Err(MMMError::NotFitted),
        }
    }

    fn forward(&self, values: ArrayView2<'_, f64>) -> MMMResult<Array2<f64>> {
        if self.transform == ValueTransform::Log {
            if let Some(((row, col), &value)) = values.indexed_iter().find(|(_, v)| **v < 0.0) {
                return Err(MMMError::NegativeLogInput { row, col, value });
            }
        }
        let transform = self.transform;
        Ok(values.mapv(|x| transform.forward(x)))
    }
}
