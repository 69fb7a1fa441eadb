//! loglik_optimizer::finite_diff — numerical derivatives of the log density.
//!
//! Purpose
//! -------
//! Supply gradients to L-BFGS when a [`LogDensity`](super::LogDensity) has no
//! analytic gradient, and supply the curvature matrix used by the Laplace
//! approximation around a posterior mode.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`] takes a forward-difference gradient, surfacing any
//!   error the objective raised while being probed.
//! - [`compute_hessian`] differentiates a gradient function with central
//!   differences, retries with forward differences if the central matrix is
//!   not finite, and symmetrizes the result.
//!
//! Invariants & assumptions
//! ------------------------
//! - Derivatives are taken in the unconstrained coordinates `Theta`; the
//!   posterior layer owns the map to constrained parameters.
//! - Objectives report failures by writing into `closure_err` and returning
//!   `NaN`, since `finitediff` closures must return plain `f64`.
//! - Returned gradients pass `validate_grad`; returned Hessians pass
//!   `validate_hessian` and are exactly symmetric.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// run_fd_diff — forward-difference gradient of `func` at `theta`.
///
/// Parameters
/// ----------
/// - `theta`: point of evaluation; its length fixes the gradient length.
/// - `func`: scalar objective. On failure it must store the error in
///   `closure_err` and return `NaN`.
/// - `closure_err`: error slot, cleared on entry.
///
/// Errors
/// ------
/// - The captured objective error, converted through `From<Error>`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` when the
///   difference quotient has the wrong length or a non-finite entry.
///
/// Examples
/// --------
/// ```rust
/// # use std::cell::RefCell;
/// # use argmin::core::Error;
/// # use ndarray::array;
/// # use bayesian_mmm::optimization::loglik_optimizer::finite_diff::run_fd_diff;
/// let closure_err: RefCell<Option<Error>> = RefCell::new(None);
/// let grad = run_fd_diff(&array![1.0, -2.0], &|x| x.dot(x), &closure_err).unwrap();
/// assert!((grad[0] - 2.0).abs() < 1e-4);
/// ```
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// compute_hessian — numerical Hessian from a gradient function.
///
/// `f` maps `theta` to the gradient of the objective whose curvature is
/// wanted. The central-difference matrix is used when it is finite and
/// square; otherwise the forward-difference matrix is validated and used.
///
/// Errors
/// ------
/// - `OptError::HessianDimMismatch` / `OptError::InvalidHessian` from the
///   forward-difference fallback.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use bayesian_mmm::optimization::loglik_optimizer::{Theta, finite_diff::compute_hessian};
/// let hess = compute_hessian(&|t: &Theta| t.mapv(|x| 3.0 * x), &array![0.5, 1.5]).unwrap();
/// assert!((hess[[1, 1]] - 3.0).abs() < 1e-6);
/// ```
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let central = theta.central_hessian(f);
    let mut hess = match validate_hessian(&central, dim) {
        Ok(()) => central,
        Err(_) => {
            let forward = theta.forward_hessian(f);
            validate_hessian(&forward, dim)?;
            forward
        }
    };
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place. Assumes a square matrix.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
