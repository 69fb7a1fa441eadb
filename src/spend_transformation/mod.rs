//! spend_transformation — lag expansion, carryover, and saturation kernels.
//!
//! Purpose
//! -------
//! Turn raw media spend into the transformed regressors of the media-mix
//! model. This is the numerical core shared by the inference machine and the
//! posterior-mode estimator; the generated model program embodies the same
//! formulas one lag row at a time.
//!
//! Key behaviors
//! -------------
//! - [`expand_lags`] builds a causal, zero-padded `(time × channel × lag)`
//!   stack from a `(time × channel)` spend matrix.
//! - Carryover kernels reduce the lag axis with normalized weights:
//!   [`geometric_decay`] (`r^L`) and [`peaked_decay`] (`r^((L-delay)^2)`).
//! - Saturation kernels compress each channel: [`logistic_saturation`]
//!   (Hill curve) and [`reach_saturation`].
//!
//! Invariants & assumptions
//! ------------------------
//! - All functions are pure: inputs are borrowed, outputs freshly allocated.
//! - Parameters are validated eagerly; a domain violation yields an error
//!   before any output is produced.
//! - Accumulation order is fixed (lag order for carryover), so repeated calls
//!   on identical input are bit-identical.
//!
//! Conventions
//! -----------
//! - Arrays of any rank are accepted at the boundary and coerced with
//!   [`crate::validation`]; wrong ranks fail with `InvalidShape`.
//! - Per-channel parameters are 1-D arrays indexed by column.
//!
//! Downstream usage
//! ----------------
//! - `inference::InferenceMachine` chains lag expansion, one carryover and
//!   one saturation kernel selected by its parameter set.
//! - `posterior` evaluates the same chain inside the log density.
//!
//! Testing notes
//! -------------
//! - Each submodule checks its kernel against fixed reference vectors and
//!   structural properties (causality, normalization, range).

pub mod carryover;
pub mod lags;
pub mod saturation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::carryover::{geometric_decay, geometric_weights, peaked_decay, peaked_weights};
pub use self::lags::expand_lags;
pub use self::saturation::{logistic, logistic_saturation, reach, reach_saturation};
