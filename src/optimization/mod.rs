//! optimization — mode finding for the media-mix posterior.
//!
//! Purpose
//! -------
//! Maximize log densities over unconstrained parameters with argmin's
//! L-BFGS, map those parameters onto bounded domains, and report failures
//! through one error type.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: the [`LogDensity`](loglik_optimizer::LogDensity)
//!   trait, [`maximize`](loglik_optimizer::maximize), and finite-difference
//!   derivatives.
//! - `numerical_stability`: softplus and logistic transforms with their
//!   inverses and derivatives.
//! - `errors`: [`OptError`](errors::OptError) and `OptResult<T>`, with
//!   conversions from argmin errors and model errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers see only unconstrained `θ`; mapping to model parameters is
//!   the caller's job.
//! - Accepted inputs are finite; invalid states are `OptError`s, not
//!   panics.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;
