//! sampling — the boundary to the external MCMC runtime.
//!
//! Purpose
//! -------
//! Marshal the data block of a generated program, hand both to a
//! [`SamplingRuntime`], and turn the returned draws into the named point
//! estimates that build a `ParameterSet`.
//!
//! Key behaviors
//! -------------
//! - [`SamplerInput`] holds `N, Y, max_lag, num_media, X_media` and, with
//!   controls, `num_ctrl, X_ctrl`; it renders the CmdStan JSON document.
//! - [`Sampler::run`] performs one opaque runtime call, keeps the model
//!   parameters, and trims each to the last `n_iter` draws.
//! - [`estimate_parameters`] reduces draws with an [`Estimator`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Data names match the program's data section exactly.
//! - The runtime is never retried; its failures become `MMMError::Runtime`.
//!
//! Testing notes
//! -------------
//! - A scripted runtime stands in for the MCMC engine in unit and
//!   integration tests.

pub mod estimation;
pub mod input;
pub mod runtime;
pub mod sampler;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::estimation::{Estimator, estimate_parameters};
pub use self::input::SamplerInput;
pub use self::runtime::{Draws, SamplingRuntime};
pub use self::sampler::{Sampler, SamplingSettings, keep_model_parameters};
