//! Laplace approximation around a posterior mode.
//!
//! The curvature of `-ℓ(θ)` at the mode is taken numerically from the
//! adapter's gradient, inverted on its positive eigenvalues, and mapped to
//! the constrained parameters with the diagonal delta method.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use serde::Serialize;

use super::density::PosteriorDensity;
use crate::{
    errors::MMMResult,
    optimization::{
        errors::OptResult,
        loglik_optimizer::{Theta, adapter::ArgMinAdapter, finite_diff::compute_hessian},
        numerical_stability::EIGEN_EPS,
    },
    sampling::SamplerInput,
};
use argmin::core::Gradient;

/// Approximate posterior standard deviations, one per layout slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaplaceSummary {
    /// Slot labels, e.g. `beta_medias[1]`.
    pub labels: Vec<String>,
    /// Constrained values at the mode.
    pub mode: Array1<f64>,
    /// Standard deviations in unconstrained coordinates.
    pub theta_sd: Array1<f64>,
    /// Delta-method standard deviations of the constrained values.
    pub sd: Array1<f64>,
}

impl LaplaceSummary {
    /// `(mode, sd)` of a slot by label.
    pub fn get(&self, label: &str) -> Option<(f64, f64)> {
        self.labels.iter().position(|l| l == label).map(|i| (self.mode[i], self.sd[i]))
    }
}

/// laplace_summary — standard deviations at `theta_hat`.
///
/// Parameters
/// ----------
/// - `density`: the log posterior that was maximized.
/// - `theta_hat`: its maximizer in unconstrained coordinates.
/// - `input`: the data the density was maximized on.
///
/// Returns
/// -------
/// A [`LaplaceSummary`]. Directions with curvature at or below `EIGEN_EPS`
/// contribute nothing, so a flat direction yields a small rather than an
/// infinite deviation.
///
/// Errors
/// ------
/// - `MMMError::Optimization` wrapping `OptError::InvalidHessian` when the
///   gradient cannot be evaluated around `theta_hat`.
/// - Layout errors for a wrong-length `theta_hat`.
pub fn laplace_summary(
    density: &PosteriorDensity, theta_hat: &Theta, input: &SamplerInput,
) -> MMMResult<LaplaceSummary> {
    let layout = density.layout();
    let mode = layout.constrain(theta_hat)?;
    let theta_sd = unconstrained_sd(density, theta_hat, input)?;
    let sd = &theta_sd * &layout.jacobian_diag(theta_hat)?.mapv(f64::abs);
    Ok(LaplaceSummary { labels: layout.labels(), mode, theta_sd, sd })
}

fn unconstrained_sd(
    density: &PosteriorDensity, theta_hat: &Theta, input: &SamplerInput,
) -> OptResult<Array1<f64>> {
    let adapter = ArgMinAdapter::new(density, input);
    let cost_grad = |theta: &Theta| {
        adapter.gradient(theta).unwrap_or_else(|_| Array1::from_elem(theta.len(), f64::NAN))
    };
    let obs_info = compute_hessian(&cost_grad, theta_hat)?;
    Ok(solve_for_sd(to_dmatrix(&obs_info)))
}

// ---- Helper methods ----

fn to_dmatrix(values: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(values.nrows(), values.ncols(), |i, j| values[[i, j]])
}

/// `sd_i = sqrt(Σ_k q_ik² / λ_k)` over eigenpairs with `λ_k > EIGEN_EPS`.
fn solve_for_sd(obs_info: DMatrix<f64>) -> Array1<f64> {
    let n = obs_info.nrows();
    let eigen = obs_info.symmetric_eigen();
    let q = eigen.eigenvectors;
    Array1::from_shape_fn(n, |i| {
        eigen
            .eigenvalues
            .iter()
            .enumerate()
            .filter(|(_, lambda)| **lambda > EIGEN_EPS)
            .map(|(k, &lambda)| q[(i, k)] * q[(i, k)] / lambda)
            .sum::<f64>()
            .sqrt()
    })
}
