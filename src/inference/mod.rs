//! inference — predictions, contributions, and evaluation from fitted parameters.
//!
//! Purpose
//! -------
//! Reproduce the transform pipeline of the generated model program outside
//! the sampler. Given a point-estimated parameter set this module predicts
//! the (normalized) target, decomposes each prediction into per-contributor
//! columns, and scores the fit on held-out data.
//!
//! Key behaviors
//! -------------
//! - [`ParameterSet`] is a tagged union over the carryover and saturation
//!   variants, built once from named estimates
//!   ([`ParameterSet::from_named`]); illegal combinations are
//!   unrepresentable.
//! - [`InferenceMachine`] chains `expand_lags`, the carryover kernel, and
//!   the saturation kernel selected by that parameter set, then forms the
//!   linear predictor `sat·β + τ (+ ctrl·γ)`.
//! - [`ContributionCalculator`] names the decomposition columns and
//!   optionally denormalizes them with the target normalizer.
//! - [`Evaluator`] reports train/test MAPE on the natural target scale.
//!
//! Invariants & assumptions
//! ------------------------
//! - Contribution columns sum to `predict` for every observation, up to
//!   floating-point reassociation.
//! - The machine never mutates its parameter set; it can be shared freely
//!   by reference.
//! - Predictions are on the normalized scale; denormalization is always an
//!   explicit step.
//!
//! Conventions
//! -----------
//! - Spend and control matrices are `(time × column)`; rows are
//!   chronological.
//! - Contribution columns are ordered media, controls, baseline.
//!
//! Testing notes
//! -------------
//! - `machine` pins reference predictions for all eight model structures
//!   and the contribution sum invariant.
//! - `evaluation` checks MAPE, splitting, and denormalization.

pub mod contributions;
pub mod evaluation;
pub mod machine;
pub mod params;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::contributions::{BASELINE, ContributionCalculator, ContributionTable};
pub use self::evaluation::{
    Evaluation, Evaluator, ObservationSet, Performance, SplitResult, mape, split_train_test,
};
pub use self::machine::{InferenceMachine, total_contribution};
pub use self::params::{CarryoverParams, ParameterSet, SaturationParams};
