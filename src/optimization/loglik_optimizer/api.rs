//! Entry point: maximize a [`LogDensity`] with L-BFGS.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogDensity, OptimOptions},
    },
};

/// maximize — find `argmax_θ ℓ(θ)` starting from `theta0`.
///
/// Parameters
/// ----------
/// - `f`: the log density.
/// - `theta0`: starting point in unconstrained coordinates.
/// - `data`: passed through to every `value`/`grad` call.
/// - `opts`: stopping rules, line search, verbosity, L-BFGS memory.
///
/// Errors
/// ------
/// - Anything `f.check` rejects.
/// - Solver construction or run failures, including errors raised by
///   `f.value` during line searches, as `OptError`.
///
/// Examples
/// --------
/// ```rust
/// use ndarray::array;
/// use bayesian_mmm::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{Cost, LogDensity, OptimOptions, Theta, maximize},
/// };
///
/// struct Normal;
/// impl LogDensity for Normal {
///     type Data = f64;
///     fn value(&self, theta: &Theta, mean: &f64) -> OptResult<Cost> {
///         Ok(-0.5 * (theta[0] - mean).powi(2))
///     }
///     fn check(&self, _: &Theta, _: &f64) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Normal, array![0.0], &3.0, &OptimOptions::default()).unwrap();
/// assert!((out.theta_hat[0] - 3.0).abs() < 1e-4);
/// ```
pub fn maximize<F: LogDensity>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
