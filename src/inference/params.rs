//! Fitted parameter sets: carryover and saturation variants plus coefficients.
use ndarray::{Array1, Array2, ArrayD, ArrayView3, Ix1, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    errors::{MMMError, MMMResult},
    program::{CarryoverKind, ModelParameter, SaturationKind},
    spend_transformation::{geometric_decay, logistic_saturation, peaked_decay, reach_saturation},
    validation::{
        check_channel_count, validate_beta_medias, validate_ecs, validate_finite, validate_half_saturations,
        validate_retain_rates, validate_slopes,
    },
};

/// Carryover parameters, one entry per media channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CarryoverParams {
    GeometricDecay { retain_rates: Array1<f64> },
    PeakedDecay { retain_rates: Array1<f64>, delays: Array1<f64> },
}

impl CarryoverParams {
    pub fn kind(&self) -> CarryoverKind {
        match self {
            CarryoverParams::GeometricDecay { .. } => CarryoverKind::GeometricDecay,
            CarryoverParams::PeakedDecay { .. } => CarryoverKind::PeakedDecay,
        }
    }

    pub fn retain_rates(&self) -> &Array1<f64> {
        match self {
            CarryoverParams::GeometricDecay { retain_rates }
            | CarryoverParams::PeakedDecay { retain_rates, .. } => retain_rates,
        }
    }

    /// Apply the kernel to a lagged `(time × channel × lag)` tensor.
    pub fn apply(&self, lagged: ArrayView3<'_, f64>) -> MMMResult<Array2<f64>> {
        match self {
            CarryoverParams::GeometricDecay { retain_rates } => geometric_decay(&lagged, retain_rates),
            CarryoverParams::PeakedDecay { retain_rates, delays } => {
                peaked_decay(&lagged, delays, retain_rates)
            }
        }
    }
}

/// Saturation parameters, one entry per media channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaturationParams {
    Logistic { ecs: Array1<f64>, slopes: Array1<f64> },
    Reach { half_saturations: Array1<f64> },
}

impl SaturationParams {
    pub fn kind(&self) -> SaturationKind {
        match self {
            SaturationParams::Logistic { .. } => SaturationKind::Logistic,
            SaturationParams::Reach { .. } => SaturationKind::Reach,
        }
    }

    pub fn apply(&self, values: &Array2<f64>) -> MMMResult<Array2<f64>> {
        match self {
            SaturationParams::Logistic { ecs, slopes } => logistic_saturation(values, ecs, slopes),
            SaturationParams::Reach { half_saturations } => {
                reach_saturation(values, half_saturations)
            }
        }
    }
}

/// ParameterSet — the fitted parameters of one media-mix model.
///
/// Purpose
/// -------
/// Carry exactly the parameters the chosen carryover and saturation kernels
/// need, together with the regression coefficients, so that a model can be
/// evaluated without probing for optional keys.
///
/// Invariants
/// ----------
/// - Every per-channel vector has `channels()` entries.
/// - Retain rates and ecs lie in `[0, 1]`; slopes and half saturations are
///   non-negative; `beta_medias` are finite and non-negative; `gamma_ctrl`
///   and `tau` are finite.
/// - Delays are checked against `max_lag` by the consumer that knows it
///   ([`InferenceMachine::new`](super::InferenceMachine::new)).
/// - Immutable after construction; deserialization re-runs validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterSetRepr", into = "ParameterSetRepr")]
pub struct ParameterSet {
    carryover: CarryoverParams,
    saturation: SaturationParams,
    beta_medias: Array1<f64>,
    gamma_ctrl: Option<Array1<f64>>,
    tau: f64,
}

#[derive(Serialize, Deserialize)]
struct ParameterSetRepr {
    carryover: CarryoverParams,
    saturation: SaturationParams,
    beta_medias: Array1<f64>,
    #[serde(default)]
    gamma_ctrl: Option<Array1<f64>>,
    tau: f64,
}

impl TryFrom<ParameterSetRepr> for ParameterSet {
    type Error = MMMError;

    fn try_from(repr: ParameterSetRepr) -> MMMResult<Self> {
        ParameterSet::new(repr.carryover, repr.saturation, repr.beta_medias, repr.gamma_ctrl, repr.tau)
    }
}

impl From<ParameterSet> for ParameterSetRepr {
    fn from(params: ParameterSet) -> Self {
        ParameterSetRepr {
            carryover: params.carryover,
            saturation: params.saturation,
            beta_medias: params.beta_medias,
            gamma_ctrl: params.gamma_ctrl,
            tau: params.tau,
        }
    }
}

impl ParameterSet {
    /// Validate and assemble a parameter set.
    ///
    /// The channel count is taken from `beta_medias`.
    ///
    /// Errors
    /// ------
    /// - `MMMError::ChannelMismatch` when a per-channel vector has the wrong
    ///   length.
    /// - `MMMError::InvalidRetainRate`, `MMMError::InvalidEc`,
    ///   `MMMError::InvalidSlope`, `MMMError::InvalidHalfSaturation`,
    ///   `MMMError::InvalidBeta` for out-of-domain entries.
    /// - `MMMError::NonFiniteValue` for non-finite coefficients.
    pub fn new(
        carryover: CarryoverParams, saturation: SaturationParams, beta_medias: Array1<f64>,
        gamma_ctrl: Option<Array1<f64>>, tau: f64,
    ) -> MMMResult<Self> {
        let channels = beta_medias.len();
        validate_beta_medias(&beta_medias)?;
        if let Some(gamma) = &gamma_ctrl {
            validate_finite(gamma, "gamma_ctrl")?;
        }
        if !tau.is_finite() {
            return Err(MMMError::NonFiniteValue { name: "tau", index: 0, value: tau });
        }

        validate_retain_rates(carryover.retain_rates(), channels)?;
        if let CarryoverParams::PeakedDecay { delays, .. } = &carryover {
            check_channel_count(delays, "delays", channels)?;
            validate_finite(delays, "delays")?;
        }
        match &saturation {
            SaturationParams::Logistic { ecs, slopes } => {
                validate_ecs(ecs, channels)?;
                validate_slopes(slopes, channels)?;
            }
            SaturationParams::Reach { half_saturations } => {
                validate_half_saturations(half_saturations, channels)?;
            }
        }

        Ok(ParameterSet { carryover, saturation, beta_medias, gamma_ctrl, tau })
    }

    /// Build a parameter set from named point estimates.
    ///
    /// Variant selection happens here and nowhere else: a `delay` entry
    /// selects peaked decay, an `ec` entry selects logistic saturation.
    /// Unknown names (such as `noise_var` or `lp__`) are ignored.
    ///
    /// Parameters
    /// ----------
    /// - `named`: map from parameter name to estimate. Per-channel entries
    ///   must be 1-D; `tau` must be 0-D or hold a single element.
    ///
    /// Errors
    /// ------
    /// - `MMMError::MissingParameter` if a required entry is absent
    ///   (`tau`, `beta_medias`, `retain_rate`, `slope` when `ec` is present,
    ///   `half_saturation` when it is not).
    /// - `MMMError::InvalidRank` for wrongly shaped entries.
    /// - Any error of [`ParameterSet::new`].
    pub fn from_named(named: &BTreeMap<String, ArrayD<f64>>) -> MMMResult<Self> {
        let retain_rates = vector(named, ModelParameter::RetainRate)?;
        let carryover = match named.get(ModelParameter::Delay.name()) {
            Some(_) => CarryoverParams::PeakedDecay {
                retain_rates,
                delays: vector(named, ModelParameter::Delay)?,
            },
            None => CarryoverParams::GeometricDecay { retain_rates },
        };
        let saturation = match named.get(ModelParameter::Ec.name()) {
            Some(_) => SaturationParams::Logistic {
                ecs: vector(named, ModelParameter::Ec)?,
                slopes: vector(named, ModelParameter::Slope)?,
            },
            None => SaturationParams::Reach {
                half_saturations: vector(named, ModelParameter::HalfSaturation)?,
            },
        };
        let gamma_ctrl = match named.get(ModelParameter::GammaCtrl.name()) {
            Some(_) => Some(vector(named, ModelParameter::GammaCtrl)?),
            None => None,
        };

        ParameterSet::new(
            carryover,
            saturation,
            vector(named, ModelParameter::BetaMedias)?,
            gamma_ctrl,
            scalar(named, ModelParameter::Tau)?,
        )
    }

    /// Inverse of [`ParameterSet::from_named`].
    pub fn to_named(&self) -> BTreeMap<String, ArrayD<f64>> {
        let mut named = BTreeMap::new();
        let mut put = |p: ModelParameter, values: &Array1<f64>| {
            named.insert(p.name().to_string(), values.clone().into_dyn());
        };
        put(ModelParameter::RetainRate, self.carryover.retain_rates());
        if let CarryoverParams::PeakedDecay { delays, .. } = &self.carryover {
            put(ModelParameter::Delay, delays);
        }
        match &self.saturation {
            SaturationParams::Logistic { ecs, slopes } => {
                put(ModelParameter::Ec, ecs);
                put(ModelParameter::Slope, slopes);
            }
            SaturationParams::Reach { half_saturations } => {
                put(ModelParameter::HalfSaturation, half_saturations);
            }
        }
        put(ModelParameter::BetaMedias, &self.beta_medias);
        if let Some(gamma) = &self.gamma_ctrl {
            put(ModelParameter::GammaCtrl, gamma);
        }
        named.insert(ModelParameter::Tau.name().to_string(), ArrayD::from_elem(IxDyn(&[]), self.tau));
        named
    }

    pub fn carryover(&self) -> &CarryoverParams {
        &self.carryover
    }

    pub fn saturation(&self) -> &SaturationParams {
        &self.saturation
    }

    pub fn beta_medias(&self) -> &Array1<f64> {
        &self.beta_medias
    }

    pub fn gamma_ctrl(&self) -> Option<&Array1<f64>> {
        self.gamma_ctrl.as_ref()
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Number of media channels.
    pub fn channels(&self) -> usize {
        self.beta_medias.len()
    }

    pub fn has_controls(&self) -> bool {
        self.gamma_ctrl.is_some()
    }

    /// Carryover then saturation on an already lagged tensor.
    pub(crate) fn transform_lagged(&self, lagged: ArrayView3<'_, f64>) -> MMMResult<Array2<f64>> {
        let carried = self.carryover.apply(lagged)?;
        self.saturation.apply(&carried)
    }
}

fn lookup<'a>(
    named: &'a BTreeMap<String, ArrayD<f64>>, parameter: ModelParameter,
) -> MMMResult<&'a ArrayD<f64>> {
    named.get(parameter.name()).ok_or(MMMError::MissingParameter { name: parameter.name() })
}

fn vector(named: &BTreeMap<String, ArrayD<f64>>, parameter: ModelParameter) -> MMMResult<Array1<f64>> {
    let values = lookup(named, parameter)?;
    values.view().into_dimensionality::<Ix1>().map(|v| v.to_owned()).map_err(|_| {
        MMMError::InvalidRank { name: parameter.name(), expected: 1, found: values.ndim() }
    })
}

fn scalar(named: &BTreeMap<String, ArrayD<f64>>, parameter: ModelParameter) -> MMMResult<f64> {
    let values = lookup(named, parameter)?;
    match values.len() {
        1 if values.ndim() <= 1 => Ok(values.iter().copied().sum()),
        _ => Err(MMMError::InvalidRank { name: parameter.name(), expected: 0, found: values.ndim() }),
    }
}
