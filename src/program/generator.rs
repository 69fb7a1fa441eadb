//! Model specification and the assembled program.
use serde::{Deserialize, Serialize};

use super::kinds::{CarryoverKind, SaturationKind};
use super::priors::ModelParameter;
use super::sections;
use crate::errors::MMMResult;

/// Structural choice of the media-mix model.
///
/// Fields
/// ------
/// - `carryover`: carryover kernel applied to each lag row.
/// - `saturation`: saturation kernel applied to the carryover output.
/// - `has_controls`: whether control regressors enter the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub carryover: CarryoverKind,
    pub saturation: SaturationKind,
    pub has_controls: bool,
}

impl ModelSpec {
    pub fn new(carryover: CarryoverKind, saturation: SaturationKind, has_controls: bool) -> Self {
        ModelSpec { carryover, saturation, has_controls }
    }

    /// Build a spec from configuration names.
    ///
    /// Errors
    /// ------
    /// - `MMMError::UnknownCarryover` / `MMMError::UnknownSaturation` for an
    ///   unrecognized name.
    pub fn from_names(carryover: &str, saturation: &str, has_controls: bool) -> MMMResult<Self> {
        Ok(ModelSpec::new(carryover.parse()?, saturation.parse()?, has_controls))
    }

    /// All eight structural combinations.
    pub fn all() -> Vec<ModelSpec> {
        let mut specs = Vec::with_capacity(8);
        for carryover in CarryoverKind::ALL {
            for saturation in SaturationKind::ALL {
                for has_controls in [true, false] {
                    specs.push(ModelSpec::new(carryover, saturation, has_controls));
                }
            }
        }
        specs
    }

    /// Free parameters in declaration order.
    pub fn parameters(&self) -> Vec<ModelParameter> {
        let mut params =
            vec![ModelParameter::NoiseVar, ModelParameter::Tau, ModelParameter::BetaMedias];
        params.extend(self.carryover_parameters());
        if self.has_controls {
            params.push(ModelParameter::GammaCtrl);
        }
        params.extend(self.saturation_parameters());
        params
    }

    /// Free parameters in the order their prior statements appear.
    pub fn prior_order(&self) -> Vec<ModelParameter> {
        let mut params = self.carryover_parameters();
        match self.saturation {
            SaturationKind::Logistic => {
                params.extend([ModelParameter::Slope, ModelParameter::Ec]);
            }
            SaturationKind::Reach => params.push(ModelParameter::HalfSaturation),
        }
        params.extend([ModelParameter::Tau, ModelParameter::BetaMedias]);
        if self.has_controls {
            params.push(ModelParameter::GammaCtrl);
        }
        params.push(ModelParameter::NoiseVar);
        params
    }

    fn carryover_parameters(&self) -> Vec<ModelParameter> {
        match self.carryover {
            CarryoverKind::GeometricDecay => vec![ModelParameter::RetainRate],
            CarryoverKind::PeakedDecay => vec![ModelParameter::RetainRate, ModelParameter::Delay],
        }
    }

    fn saturation_parameters(&self) -> Vec<ModelParameter> {
        match self.saturation {
            SaturationKind::Logistic => vec![ModelParameter::Ec, ModelParameter::Slope],
            SaturationKind::Reach => vec![ModelParameter::HalfSaturation],
        }
    }
}

/// A generated probabilistic program: five immutable text sections.
///
/// Two programs are equivalent iff [`normalize_whitespace`] of their
/// [`ModelProgram::code`] is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProgram {
    spec: ModelSpec,
    functions: String,
    data: String,
    parameters: String,
    transformed_parameters: String,
    model: String,
}

impl ModelProgram {
    pub fn generate(spec: ModelSpec) -> Self {
        ModelProgram {
            spec,
            functions: sections::functions_section(&spec),
            data: sections::data_section(&spec),
            parameters: sections::parameters_section(&spec),
            transformed_parameters: sections::transformed_parameters_section(&spec),
            model: sections::model_section(&spec),
        }
    }

    /// Full program text: functions, data, parameters, transformed
    /// parameters, model, separated by newlines.
    pub fn code(&self) -> String {
        [
            self.functions.as_str(),
            self.data.as_str(),
            self.parameters.as_str(),
            self.transformed_parameters.as_str(),
            self.model.as_str(),
        ]
        .join("\n")
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    pub fn functions(&self) -> &str {
        &self.functions
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    pub fn transformed_parameters(&self) -> &str {
        &self.transformed_parameters
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Strip spaces, tabs, and newlines; the equivalence key for program text.
pub fn normalize_whitespace(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, ' ' | '\t' | '\n' | '\r')).collect()
}
