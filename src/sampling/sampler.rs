//! Sampler: one runtime call, then draw filtering and trimming.
use ndarray::{Axis, Slice};
use tracing::{debug, info};

use super::{
    input::SamplerInput,
    runtime::{Draws, SamplingRuntime},
};
use crate::{
    errors::{MMMError, MMMResult},
    program::{ModelParameter, ModelProgram, ModelSpec},
};

/// Draw count and chain count for one sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    n_iter: usize,
    chains: usize,
}

impl SamplingSettings {
    /// Errors
    /// ------
    /// - `MMMError::InvalidSetting` if either count is zero.
    pub fn new(n_iter: usize, chains: usize) -> MMMResult<Self> {
        if n_iter == 0 {
            return Err(MMMError::InvalidSetting { field: "n_iter", reason: "must be at least 1" });
        }
        if chains == 0 {
            return Err(MMMError::InvalidSetting { field: "chains", reason: "must be at least 1" });
        }
        Ok(SamplingSettings { n_iter, chains })
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn chains(&self) -> usize {
        self.chains
    }
}

/// Sampler — runs a generated program on a [`SamplingRuntime`].
///
/// The program is generated once at construction. [`Sampler::run`] keeps the
/// parameters the inference machine consumes (`retain_rate`, `delay`, `ec`,
/// `slope`, `half_saturation`, `beta_medias`, `gamma_ctrl`, `tau`) and the
/// last `n_iter` draws of each; everything else the runtime returns is
/// dropped.
#[derive(Debug)]
pub struct Sampler<R> {
    runtime: R,
    program: ModelProgram,
}

impl<R: SamplingRuntime> Sampler<R> {
    pub fn new(runtime: R, spec: ModelSpec) -> Self {
        Sampler { runtime, program: ModelProgram::generate(spec) }
    }

    pub fn program(&self) -> &ModelProgram {
        &self.program
    }

    /// Errors
    /// ------
    /// - `MMMError::ControlMismatch` if the input's controls disagree with
    ///   the program's.
    /// - `MMMError::Runtime` for any runtime failure.
    /// - `MMMError::InvalidRank` if a kept parameter has no draw axis.
    pub fn run(&self, input: &SamplerInput, settings: SamplingSettings) -> MMMResult<Draws> {
        let spec = self.program.spec();
        if spec.has_controls != input.has_controls() {
            return Err(MMMError::ControlMismatch {
                reason: "the sampler input and the model program disagree on control variables",
            });
        }

        info!(
            carryover = spec.carryover.name(),
            saturation = spec.saturation.name(),
            has_controls = spec.has_controls,
            n_obs = input.n_obs(),
            n_iter = settings.n_iter(),
            chains = settings.chains(),
            "sampling posterior"
        );
        let raw = self.runtime.sample(&self.program, input, settings.n_iter(), settings.chains())?;
        let draws = keep_model_parameters(raw, settings.n_iter())?;
        debug!(parameters = ?draws.keys().collect::<Vec<_>>(), "kept posterior draws");
        Ok(draws)
    }
}

/// Keep predictive parameters and their last `n_iter` draws.
pub fn keep_model_parameters(raw: Draws, n_iter: usize) -> MMMResult<Draws> {
    let mut kept = Draws::new();
    for (name, values) in raw {
        let Some(parameter) = ModelParameter::from_name(&name) else { continue };
        if !parameter.is_predictive() {
            continue;
        }
        if values.ndim() == 0 {
            return Err(MMMError::InvalidRank { name: parameter.name(), expected: 1, found: 0 });
        }
        let n_draws = values.len_of(Axis(0));
        let start = n_draws.saturating_sub(n_iter) as isize;
        kept.insert(name, values.slice_axis(Axis(0), Slice::from(start..)).to_owned());
    }
    Ok(kept)
}
