//! loglik_optimizer — argmin-backed maximization of log densities.
//!
//! Purpose
//! -------
//! Find the mode of an unnormalized log density over unconstrained
//! parameters. The posterior layer implements [`LogDensity`] for the
//! media-mix posterior and calls [`maximize`] to obtain a point estimate
//! without an external sampler.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost `-ℓ(θ)`.
//! - [`maximize`] validates the start with [`LogDensity::check`], builds an
//!   L-BFGS solver for the chosen line search, runs it, and returns an
//!   [`OptimOutcome`].
//! - [`finite_diff`] supplies gradients when no analytic one exists and
//!   Hessians for curvature-based uncertainty.
//!
//! Invariants & assumptions
//! ------------------------
//! - All user-facing values are in log-density space; only the adapter
//!   sees the cost.
//! - Callback failures are `OptError`s, never panics.
//! - [`Tolerances`] and [`OptimOptions`] are validated on construction.
//!
//! Testing notes
//! -------------
//! - `api.rs` runs both line searches on a Gaussian kernel with a known
//!   mode; the posterior tests run the optimizer on simulated media data.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogDensity, OptimOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};
