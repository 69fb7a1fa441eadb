//! ParameterLayout — unconstrained coordinates for a model's free parameters.
use ndarray::{Array1, ArrayD, IxDyn, s};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::{
    errors::{MMMError, MMMResult},
    inference::ParameterSet,
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::{
            POSITIVE_FLOOR, logistic_deriv, safe_logistic, safe_logit, safe_softplus,
            safe_softplus_inv, softplus_deriv,
        },
    },
    program::{CarryoverKind, ModelParameter, ModelSpec},
    sampling::SamplerInput,
};

/// Starting noise variance when the target has (almost) no spread.
const MIN_INITIAL_NOISE_VAR: f64 = 1e-3;

/// How an unconstrained coordinate maps onto a parameter's support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Link {
    /// `(0, ∞)` via softplus.
    Softplus,
    /// `(0, 1)` via the logistic function.
    Logistic,
    /// `(0, upper)` via `upper · logistic`.
    ScaledLogistic { upper: f64 },
    /// All of ℝ.
    Identity,
}

impl Link {
    pub fn constrain(self, x: f64) -> f64 {
        match self {
            Link::Softplus => safe_softplus(x).max(POSITIVE_FLOOR),
            Link::Logistic => safe_logistic(x),
            Link::ScaledLogistic { upper } => upper * safe_logistic(x),
            Link::Identity => x,
        }
    }

    pub fn unconstrain(self, value: f64) -> f64 {
        match self {
            Link::Softplus => safe_softplus_inv(value),
            Link::Logistic => safe_logit(value),
            Link::ScaledLogistic { upper } => safe_logit(value / upper),
            Link::Identity => value,
        }
    }

    /// `d constrain / dx` at `x`.
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Link::Softplus => softplus_deriv(x),
            Link::Logistic => logistic_deriv(x),
            Link::ScaledLogistic { upper } => upper * logistic_deriv(x),
            Link::Identity => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Block {
    parameter: ModelParameter,
    link: Link,
    range: Range<usize>,
}

/// Packs the free parameters of one model structure into a flat vector.
///
/// Blocks follow [`ModelSpec::parameters`] (the program's declaration
/// order): `noise_var`, `tau`, `beta_medias`, `retain_rate`, [`delay`],
/// [`gamma_ctrl`], then `ec, slope` or `half_saturation`. Scalars take one
/// slot, per-channel parameters `channels` slots, `gamma_ctrl` one slot per
/// control.
///
/// Links mirror the program's bounds: softplus for `<lower=0>`, logistic for
/// `<lower=0, upper=1>`, scaled logistic for `delay ∈ (0, max_lag - 1)`,
/// identity for `gamma_ctrl`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterLayout {
    spec: ModelSpec,
    channels: usize,
    n_ctrl: Option<usize>,
    max_lag: usize,
    blocks: Vec<Block>,
    dim: usize,
}

impl ParameterLayout {
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` for zero channels, a zero-width control
    ///   block, `max_lag == 0`, or peaked decay with `max_lag < 2` (the
    ///   delay support `(0, max_lag - 1)` would be empty).
    /// - `MMMError::ControlMismatch` if `n_ctrl` disagrees with
    ///   `spec.has_controls`.
    pub fn new(
        spec: ModelSpec, channels: usize, n_ctrl: Option<usize>, max_lag: usize,
    ) -> MMMResult<Self> {
        if channels == 0 {
            return Err(MMMError::InvalidSetting { field: "channels", reason: "must be at least 1" });
        }
        if max_lag == 0 {
            return Err(MMMError::InvalidSetting { field: "max_lag", reason: "must be at least 1" });
        }
        if spec.carryover == CarryoverKind::PeakedDecay && max_lag < 2 {
            return Err(MMMError::InvalidSetting {
                field: "max_lag",
                reason: "peaked decay needs at least two lag slots",
            });
        }
        if spec.has_controls != n_ctrl.is_some() {
            return Err(MMMError::ControlMismatch {
                reason: "the model structure and the data disagree on control variables",
            });
        }
        if n_ctrl == Some(0) {
            return Err(MMMError::InvalidSetting { field: "n_ctrl", reason: "must be at least 1" });
        }

        let mut blocks = Vec::new();
        let mut offset = 0;
        for parameter in spec.parameters() {
            let len = match parameter {
                ModelParameter::NoiseVar | ModelParameter::Tau => 1,
                ModelParameter::GammaCtrl => n_ctrl.unwrap_or(0),
                _ => channels,
            };
            let link = match parameter {
                ModelParameter::RetainRate | ModelParameter::Ec => Link::Logistic,
                ModelParameter::Delay => Link::ScaledLogistic { upper: max_lag as f64 - 1.0 },
                ModelParameter::GammaCtrl => Link::Identity,
                _ => Link::Softplus,
            };
            blocks.push(Block { parameter, link, range: offset..offset + len });
            offset += len;
        }
        Ok(ParameterLayout { spec, channels, n_ctrl, max_lag, blocks, dim: offset })
    }

    /// Layout matching the shape of a sampler input.
    pub fn for_input(spec: ModelSpec, input: &SamplerInput) -> MMMResult<Self> {
        ParameterLayout::new(spec, input.num_media(), input.num_ctrl(), input.max_lag())
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn n_ctrl(&self) -> Option<usize> {
        self.n_ctrl
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Length of `θ`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Slots of `parameter` in `θ`, if the structure declares it.
    pub fn range(&self, parameter: ModelParameter) -> Option<Range<usize>> {
        self.blocks.iter().find(|b| b.parameter == parameter).map(|b| b.range.clone())
    }

    /// One label per slot: `noise_var`, `tau`, `beta_medias[0]`, ...
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.dim);
        for block in &self.blocks {
            match block.parameter {
                ModelParameter::NoiseVar | ModelParameter::Tau => {
                    labels.push(block.parameter.name().to_string());
                }
                _ => labels.extend(
                    (0..block.range.len()).map(|i| format!("{}[{i}]", block.parameter.name())),
                ),
            }
        }
        labels
    }

    /// `(parameter, link)` per slot, in `θ` order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (ModelParameter, Link)> + '_ {
        self.blocks.iter().flat_map(|b| b.range.clone().map(move |_| (b.parameter, b.link)))
    }

    /// Map `θ` onto the parameters' supports, slot by slot.
    ///
    /// Errors
    /// ------
    /// - `MMMError::ChannelMismatch` if `theta.len() != dim`.
    pub fn constrain(&self, theta: &Theta) -> MMMResult<Array1<f64>> {
        self.check_len(theta.len())?;
        Ok(Array1::from_iter(self.slots().zip(theta.iter()).map(|((_, link), &x)| link.constrain(x))))
    }

    /// Inverse of [`constrain`](Self::constrain).
    pub fn unconstrain(&self, values: &Array1<f64>) -> MMMResult<Theta> {
        self.check_len(values.len())?;
        Ok(Array1::from_iter(
            self.slots().zip(values.iter()).map(|((_, link), &v)| link.unconstrain(v)),
        ))
    }

    /// Diagonal of the Jacobian of [`constrain`](Self::constrain) at `θ`.
    pub fn jacobian_diag(&self, theta: &Theta) -> MMMResult<Array1<f64>> {
        self.check_len(theta.len())?;
        Ok(Array1::from_iter(self.slots().zip(theta.iter()).map(|((_, link), &x)| link.derivative(x))))
    }

    /// Split constrained values into a parameter set and the noise
    /// variance.
    ///
    /// Errors
    /// ------
    /// - `MMMError::ChannelMismatch` for a wrong-length vector.
    /// - Any domain error of [`ParameterSet::new`].
    pub fn assemble(&self, values: &Array1<f64>) -> MMMResult<(ParameterSet, f64)> {
        self.check_len(values.len())?;
        let mut named = BTreeMap::new();
        let mut noise_var = f64::NAN;
        for block in &self.blocks {
            let slice = values.slice(s![block.range.clone()]);
            match block.parameter {
                ModelParameter::NoiseVar => noise_var = slice[0],
                ModelParameter::Tau => {
                    named.insert(block.parameter.name().to_string(), ArrayD::from_elem(IxDyn(&[]), slice[0]));
                }
                _ => {
                    named.insert(block.parameter.name().to_string(), slice.to_owned().into_dyn());
                }
            }
        }
        Ok((ParameterSet::from_named(&named)?, noise_var))
    }

    /// Inverse of [`assemble`](Self::assemble).
    ///
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` if the parameter set's variants differ
    ///   from this layout's structure.
    /// - `MMMError::ChannelMismatch` / `MMMError::ControlMismatch` for
    ///   mismatched channel or control counts.
    pub fn flatten(&self, params: &ParameterSet, noise_var: f64) -> MMMResult<Array1<f64>> {
        if params.carryover().kind() != self.spec.carryover
            || params.saturation().kind() != self.spec.saturation
        {
            return Err(MMMError::InvalidSetting {
                field: "parameters",
                reason: "carryover or saturation kind differs from the model structure",
            });
        }
        if params.channels() != self.channels {
            return Err(MMMError::ChannelMismatch {
                name: "beta_medias",
                expected: self.channels,
                found: params.channels(),
            });
        }
        if params.gamma_ctrl().map(|g| g.len()) != self.n_ctrl {
            return Err(MMMError::ControlMismatch {
                reason: "gamma_ctrl does not match the layout's control count",
            });
        }
        let named = params.to_named();
        let mut values = Array1::zeros(self.dim);
        for block in &self.blocks {
            let mut target = values.slice_mut(s![block.range.clone()]);
            if block.parameter == ModelParameter::NoiseVar {
                target.fill(noise_var);
                continue;
            }
            let source = named
                .get(block.parameter.name())
                .ok_or(MMMError::MissingParameter { name: block.parameter.name() })?;
            for (t, &v) in target.iter_mut().zip(source.iter()) {
                *t = v;
            }
        }
        Ok(values)
    }

    /// `θ ↦ (ParameterSet, noise_var)`.
    pub fn unpack(&self, theta: &Theta) -> MMMResult<(ParameterSet, f64)> {
        self.assemble(&self.constrain(theta)?)
    }

    /// `(ParameterSet, noise_var) ↦ θ`.
    pub fn pack(&self, params: &ParameterSet, noise_var: f64) -> MMMResult<Theta> {
        self.unconstrain(&self.flatten(params, noise_var)?)
    }

    /// Starting point for the optimizer.
    ///
    /// `tau` starts at the target mean and `noise_var` at the target
    /// variance (at least `1e-3`). Media coefficients start at 0.5, retain
    /// rates and ECs at 0.5, slopes and half saturations at 1, delays in
    /// the middle of their range, control coefficients at 0.
    pub fn initial_theta(&self, y: &Array1<f64>) -> MMMResult<Theta> {
        let mean = y.iter().mean();
        let variance = y.iter().variance();
        let tau = if mean.is_finite() { mean.max(POSITIVE_FLOOR) } else { 1.0 };
        let noise_var =
            if variance.is_finite() { variance.max(MIN_INITIAL_NOISE_VAR) } else { 1.0 };

        let mut values = Array1::zeros(self.dim);
        for block in &self.blocks {
            let start = match block.parameter {
                ModelParameter::NoiseVar => noise_var,
                ModelParameter::Tau => tau,
                ModelParameter::BetaMedias | ModelParameter::RetainRate | ModelParameter::Ec => 0.5,
                ModelParameter::Slope | ModelParameter::HalfSaturation => 1.0,
                ModelParameter::Delay => 0.5 * (self.max_lag as f64 - 1.0),
                ModelParameter::GammaCtrl => 0.0,
            };
            values.slice_mut(s![block.range.clone()]).fill(start);
        }
        self.unconstrain(&values)
    }

    fn check_len(&self, found: usize) -> MMMResult<()> {
        if found != self.dim {
            return Err(MMMError::ChannelMismatch { name: "theta", expected: self.dim, found });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{CarryoverParams, SaturationParams};
    use crate::program::SaturationKind;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Block order, sizes, and labels for two structures.
    // - Pack/unpack of a parameter set through the links.
    // - Starting values and structural mismatches.
    // -------------------------------------------------------------------------

    fn peaked_logistic() -> ModelSpec {
        ModelSpec::new(CarryoverKind::PeakedDecay, SaturationKind::Logistic, true)
    }

    #[test]
    // Purpose
    // -------
    // Slots follow the declaration order with the right widths.
    //
    // Given
    // -----
    // - Peaked/logistic with 2 channels, 3 controls, `max_lag = 4`.
    //
    // Expect
    // ------
    // - dim = 1 + 1 + 2 + 2 + 2 + 3 + 2 + 2 = 15.
    // - `gamma_ctrl` occupies 8..11; labels start `noise_var, tau,
    //   beta_medias[0]`.
    fn layout_follows_declaration_order() {
        // Act
        let layout = ParameterLayout::new(peaked_logistic(), 2, Some(3), 4).unwrap();

        // Assert
        assert_eq!(layout.dim(), 15);
        assert_eq!(layout.range(ModelParameter::GammaCtrl), Some(8..11));
        assert_eq!(layout.range(ModelParameter::HalfSaturation), None);
        let labels = layout.labels();
        assert_eq!(&labels[..3], &["noise_var", "tau", "beta_medias[0]"]);
        assert_eq!(labels[14], "slope[1]");
    }

    #[test]
    // Purpose
    // -------
    // A parameter set survives pack then unpack.
    //
    // Given
    // -----
    // - Peaked/logistic parameters with delays inside (0, 3) and noise
    //   variance 0.2.
    //
    // Expect
    // ------
    // - The same parameter set and noise variance (to 1e-9).
    fn pack_then_unpack_recovers_parameters() {
        // Arrange
        let layout = ParameterLayout::new(peaked_logistic(), 2, Some(1), 4).unwrap();
        let params = ParameterSet::new(
            CarryoverParams::PeakedDecay { retain_rates: array![0.3, 0.8], delays: array![0.5, 2.0] },
            SaturationParams::Logistic { ecs: array![0.4, 0.7], slopes: array![1.5, 3.0] },
            array![0.9, 0.1],
            Some(array![-0.4]),
            1.2,
        )
        .unwrap();

        // Act
        let theta = layout.pack(&params, 0.2).unwrap();
        let (back, noise_var) = layout.unpack(&theta).unwrap();

        // Assert
        assert_relative_eq!(noise_var, 0.2, epsilon = 1e-9);
        assert_relative_eq!(back.tau(), 1.2, epsilon = 1e-9);
        for (got, want) in back.beta_medias().iter().zip(params.beta_medias()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-9);
        }
        match back.carryover() {
            CarryoverParams::PeakedDecay { delays, .. } => {
                assert_relative_eq!(delays[0], 0.5, epsilon = 1e-9);
                assert_relative_eq!(delays[1], 2.0, epsilon = 1e-9);
            }
            other => panic!("expected peaked decay, got {other:?}"),
        }
        assert_relative_eq!(back.gamma_ctrl().unwrap()[0], -0.4, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Starting values decode to the documented defaults.
    //
    // Given
    // -----
    // - Geometric/reach without controls, target [1, 2, 3].
    //
    // Expect
    // ------
    // - tau = 2, noise_var = 1, beta = 0.5, retain = 0.5, half = 1.
    fn initial_theta_decodes_to_defaults() {
        // Arrange
        let spec = ModelSpec::new(CarryoverKind::GeometricDecay, SaturationKind::Reach, false);
        let layout = ParameterLayout::new(spec, 1, None, 2).unwrap();

        // Act
        let theta = layout.initial_theta(&array![1.0, 2.0, 3.0]).unwrap();
        let (params, noise_var) = layout.unpack(&theta).unwrap();

        // Assert
        assert_relative_eq!(params.tau(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(noise_var, 1.0, epsilon = 1e-9);
        assert_relative_eq!(params.beta_medias()[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(params.carryover().retain_rates()[0], 0.5, epsilon = 1e-9);
        match params.saturation() {
            SaturationParams::Reach { half_saturations } => {
                assert_relative_eq!(half_saturations[0], 1.0, epsilon = 1e-9)
            }
            other => panic!("expected reach, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Structural mismatches are rejected.
    //
    // Given
    // -----
    // - Peaked decay with `max_lag = 1`; a controlled spec without a
    //   control count; a θ of the wrong length.
    //
    // Expect
    // ------
    // - `InvalidSetting`, `ControlMismatch`, `ChannelMismatch`.
    fn structural_mismatches_are_rejected() {
        // Act
        let short_lag = ParameterLayout::new(peaked_logistic(), 2, Some(1), 1).unwrap_err();
        let no_ctrl = ParameterLayout::new(peaked_logistic(), 2, None, 4).unwrap_err();
        let layout = ParameterLayout::new(peaked_logistic(), 2, Some(1), 4).unwrap();
        let bad_theta = layout.unpack(&array![0.0, 1.0]).unwrap_err();

        // Assert
        assert!(matches!(short_lag, MMMError::InvalidSetting { field: "max_lag", .. }));
        assert!(matches!(no_ctrl, MMMError::ControlMismatch { .. }));
        assert!(matches!(bad_theta, MMMError::ChannelMismatch { name: "theta", .. }));
    }
}
