//! posterior — sampler-free posterior mode and Laplace summary.
//!
//! Purpose
//! -------
//! Evaluate the log posterior that a generated program declares, directly
//! in Rust, and maximize it with the crate's L-BFGS driver. This gives a
//! fast point estimate and approximate standard deviations without an
//! external sampling runtime.
//!
//! Key behaviors
//! -------------
//! - [`ParameterLayout`] flattens the parameters a [`ModelSpec`] declares
//!   into one unconstrained vector, with a [`Link`] per slot mirroring the
//!   program's declared bounds.
//! - [`PosteriorDensity`] sums the prior table and the Gaussian likelihood
//!   and implements [`LogDensity`].
//! - [`fit_posterior_mode`] runs the optimizer and decodes the result into
//!   a [`ParameterSet`] plus the noise variance.
//! - [`laplace_summary`] inverts the numerical curvature at the mode.
//!
//! Invariants & assumptions
//! ------------------------
//! - Slot order follows [`ModelSpec::parameters`]; labels index channels
//!   and controls from zero.
//! - The density uses the same lagged tensor as the sampler input, so a
//!   mode and a sampler draw are scored on the same data.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the link maps, the likelihood in closed form, and
//!   mode fitting on simulated data for both carryover kinds.
//!
//! [`ModelSpec`]: crate::program::ModelSpec
//! [`ModelSpec::parameters`]: crate::program::ModelSpec::parameters
//! [`LogDensity`]: crate::optimization::loglik_optimizer::LogDensity
//! [`ParameterSet`]: crate::inference::ParameterSet

pub mod density;
pub mod laplace;
pub mod layout;
pub mod mode;

pub use density::PosteriorDensity;
pub use laplace::{LaplaceSummary, laplace_summary};
pub use layout::{Link, ParameterLayout};
pub use mode::{PosteriorMode, fit_posterior_mode};
