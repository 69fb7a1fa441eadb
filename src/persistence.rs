//! persistence — save and restore a fitted model.
//!
//! A [`FittedModel`] is everything `predict` needs after training: the
//! parameter set, `max_lag`, the model structure and the fitted target
//! normalizer (plus, optionally, the fitted predictor normalizer). It
//! round-trips through JSON with `serde_json`; floats are written in
//! shortest round-trip form and parsed exactly, so predictions after a
//! restore are bit-identical to those before it.
use ndarray::{Array1, ArrayBase, ArrayViewD, Axis, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{MMMError, MMMResult},
    inference::{InferenceMachine, ParameterSet},
    normalizer::Normalizer,
    program::ModelSpec,
};

/// Format version written into every document.
pub const FORMAT_VERSION: u32 = 1;

/// A fitted media-mix model ready for prediction.
///
/// Invariants
/// ----------
/// - `parameters` and `max_lag` form a valid [`InferenceMachine`].
/// - `spec` matches the variants of `parameters`.
/// - `target_normalizer` (and `predictor_normalizer`, when present) is
///   fitted.
/// - Deserialization re-checks all of the above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FittedModelRepr", into = "FittedModelRepr")]
pub struct FittedModel {
    spec: ModelSpec,
    machine: InferenceMachine,
    target_normalizer: Normalizer,
    predictor_normalizer: Option<Normalizer>,
}

#[derive(Serialize, Deserialize)]
struct FittedModelRepr {
    format_version: u32,
    spec: ModelSpec,
    parameters: ParameterSet,
    max_lag: usize,
    target_normalizer: Normalizer,
    #[serde(default)]
    predictor_normalizer: Option<Normalizer>,
}

impl TryFrom<FittedModelRepr> for FittedModel {
    type Error = MMMError;

    fn try_from(repr: FittedModelRepr) -> MMMResult<Self> {
        if repr.format_version != FORMAT_VERSION {
            return Err(MMMError::Persistence {
                text: format!(
                    "unsupported format version {}, expected {FORMAT_VERSION}",
                    repr.format_version
                ),
            });
        }
        let machine = InferenceMachine::new(repr.parameters, repr.max_lag)?;
        FittedModel::with_spec(repr.spec, machine, repr.target_normalizer, repr.predictor_normalizer)
    }
}

impl From<FittedModel> for FittedModelRepr {
    fn from(model: FittedModel) -> Self {
        FittedModelRepr {
            format_version: FORMAT_VERSION,
            spec: model.spec,
            max_lag: model.machine.max_lag(),
            parameters: model.machine.params().clone(),
            target_normalizer: model.target_normalizer,
            predictor_normalizer: model.predictor_normalizer,
        }
    }
}

impl FittedModel {
    /// Bundle a machine with its fitted target normalizer. The model
    /// structure is read off the parameter set.
    ///
    /// Errors
    /// ------
    /// - `MMMError::NotFitted` if `target_normalizer` is not fitted.
    pub fn new(machine: InferenceMachine, target_normalizer: Normalizer) -> MMMResult<Self> {
        let params = machine.params();
        let spec = ModelSpec::new(params.carryover().kind(), params.saturation().kind(), params.has_controls());
        FittedModel::with_spec(spec, machine, target_normalizer, None)
    }

    /// Attach the fitted predictor normalizer used in training.
    ///
    /// Errors
    /// ------
    /// - `MMMError::NotFitted` if `normalizer` is not fitted.
    pub fn with_predictor_normalizer(mut self, normalizer: Normalizer) -> MMMResult<Self> {
        if !normalizer.is_fitted() {
            return Err(MMMError::NotFitted);
        }
        self.predictor_normalizer = Some(normalizer);
        Ok(self)
    }

    fn with_spec(
        spec: ModelSpec, machine: InferenceMachine, target_normalizer: Normalizer,
        predictor_normalizer: Option<Normalizer>,
    ) -> MMMResult<Self> {
        let params = machine.params();
        if spec.carryover != params.carryover().kind()
            || spec.saturation != params.saturation().kind()
            || spec.has_controls != params.has_controls()
        {
            return Err(MMMError::Persistence {
                text: "model structure does not match the parameter set".to_string(),
            });
        }
        let all_fitted =
            target_normalizer.is_fitted() && predictor_normalizer.as_ref().is_none_or(Normalizer::is_fitted);
        if !all_fitted {
            return Err(MMMError::NotFitted);
        }
        Ok(FittedModel { spec, machine, target_normalizer, predictor_normalizer })
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    pub fn machine(&self) -> &InferenceMachine {
        &self.machine
    }

    pub fn target_normalizer(&self) -> &Normalizer {
        &self.target_normalizer
    }

    pub fn predictor_normalizer(&self) -> Option<&Normalizer> {
        self.predictor_normalizer.as_ref()
    }

    /// Normalized-scale prediction; see [`InferenceMachine::predict`].
    pub fn predict<S, D>(&self, spends: &ArrayBase<S, D>, ctrl: Option<ArrayViewD<'_, f64>>) -> MMMResult<Array1<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.machine.predict(spends, ctrl)
    }

    /// Prediction on the natural target scale.
    pub fn predict_natural<S, D>(
        &self, spends: &ArrayBase<S, D>, ctrl: Option<ArrayViewD<'_, f64>>,
    ) -> MMMResult<Array1<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let normalized = self.predict(spends, ctrl)?.insert_axis(Axis(1));
        let natural = self.target_normalizer.reverse_transform(&normalized)?;
        Ok(natural.column(0).to_owned())
    }

    pub fn to_json(&self) -> MMMResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Errors
    /// ------
    /// - `MMMError::Persistence` for malformed JSON, an unknown format
    ///   version, parameters that fail validation, or an unfitted
    ///   normalizer.
    pub fn from_json(text: &str) -> MMMResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
