//! The seam to the external probabilistic-programming runtime.
use ndarray::ArrayD;
use std::collections::BTreeMap;

use super::input::SamplerInput;
use crate::program::ModelProgram;

/// Posterior draws by parameter name. The leading axis of every array
/// indexes draws.
pub type Draws = BTreeMap<String, ArrayD<f64>>;

/// An engine that compiles a generated program and samples its posterior.
///
/// Implementations own compilation, warmup, and chain orchestration; the
/// crate treats `sample` as one opaque blocking call and never retries it.
///
/// Contract
/// --------
/// - `sample` returns every declared parameter (extra entries such as
///   `lp__` or `mu` are allowed), each with a leading axis of post-warmup
///   draws pooled over `chains`.
/// - Failures are reported as `anyhow::Error`; they surface to callers as
///   `MMMError::Runtime`.
pub trait SamplingRuntime {
    fn sample(
        &self, program: &ModelProgram, input: &SamplerInput, n_iter: usize, chains: usize,
    ) -> anyhow::Result<Draws>;
}

impl<R: SamplingRuntime + ?Sized> SamplingRuntime for &R {
    fn sample(
        &self, program: &ModelProgram, input: &SamplerInput, n_iter: usize, chains: usize,
    ) -> anyhow::Result<Draws> {
        (**self).sample(program, input, n_iter, chains)
    }
}

impl<R: SamplingRuntime + ?Sized> SamplingRuntime for Box<R> {
    fn sample(
        &self, program: &ModelProgram, input: &SamplerInput, n_iter: usize, chains: usize,
    ) -> anyhow::Result<Draws> {
        (**self).sample(program, input, n_iter, chains)
    }
}
