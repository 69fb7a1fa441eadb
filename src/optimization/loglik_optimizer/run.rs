//! Executor wiring shared by both line-search variants.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{Grad, LogDensity, OptimOptions, OptimOutcome, Theta, adapter::ArgMinAdapter},
};
use argmin::core::{CostFunction, Executor, State};
use tracing::{debug, trace};

/// run_lbfgs — execute `solver` on `problem` from `theta0`.
///
/// Applies `opts.tols.max_iter` to the executor (tolerances were applied by
/// the builder). With `opts.verbose`, the starting density and the final
/// state are logged through `tracing`.
///
/// Errors
/// ------
/// - argmin run failures, including callback errors, converted to
///   `OptError`.
/// - Validation failures of the final state (see `OptimOutcome::new`).
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &OptimOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogDensity,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    if opts.verbose {
        let start = -problem.cost(&theta0)?;
        debug!(log_density = start, dim = theta0.len(), "starting L-BFGS");
    }
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.param(theta0));
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let outcome = OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )?;
    if opts.verbose {
        debug!(
            log_density = outcome.value,
            iterations = outcome.iterations,
            status = %outcome.status,
            grad_norm = ?outcome.grad_norm,
            "L-BFGS finished"
        );
    }
    trace!(fn_evals = ?outcome.fn_evals, "function evaluation counts");
    Ok(outcome)
}
