//! numerical_stability — guarded transforms for unconstrained optimization.
//!
//! Purpose
//! -------
//! Map unconstrained optimizer coordinates onto the domains of media-mix
//! parameters (positive scales, unit-interval rates) and back, without
//! overflow, and share the small tolerances the posterior layer relies on.
//!
//! Key behaviors
//! -------------
//! - [`safe_softplus`] / [`safe_softplus_inv`] for `(0, ∞)` parameters.
//! - [`safe_logistic`] / [`safe_logit`] for `(0, 1)` parameters.
//! - Derivatives of both maps for delta-method standard deviations.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite; outputs are finite and strictly inside the target
//!   domain.
//! - Pure functions with no logging or I/O.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    EIGEN_EPS, LOGIT_EPS, POSITIVE_FLOOR, logistic_deriv, safe_logistic, safe_logit, safe_softplus,
    safe_softplus_inv, softplus_deriv,
};
