//! program — generation of the probabilistic model program.
//!
//! Purpose
//! -------
//! Emit the Stan program sampled by the external runtime from three
//! structural choices: carryover kernel, saturation kernel, and whether
//! control regressors are present.
//!
//! Key behaviors
//! -------------
//! - [`ModelSpec`] fixes the structure; names parse through [`CarryoverKind`]
//!   and [`SaturationKind`] (legacy aliases accepted).
//! - [`sections`] holds one pure function per program section.
//! - [`ModelProgram::generate`] assembles the five sections;
//!   [`ModelProgram::code`] joins them in fixed order.
//! - [`priors`] is the prior table shared with the posterior-mode estimator.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output depends only on the spec; identical specs give identical text.
//! - Kernel bodies mirror `spend_transformation` for a single lag row.
//! - Data names match the keys produced by `sampling::SamplerInput`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover section selection and determinism.
//! - `tests/program_conformance.rs` compares all eight programs to reference
//!   text under whitespace normalization.

pub mod generator;
pub mod kinds;
pub mod priors;
pub mod sections;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::generator::{ModelProgram, ModelSpec, normalize_whitespace};
pub use self::kinds::{CarryoverKind, SaturationKind};
pub use self::priors::{ModelParameter, Prior};
