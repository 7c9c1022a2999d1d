use std::cell::RefCell;

use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::BFGS;
use tracing::{debug, trace};

use crate::depth_pipeline::solver::minimizer::{
    BestPoint, MinimizeResult, Minimizer, TrackedProblem, trivial_result,
};

/// Quasi-Newton minimizer on central-difference gradients.
///
/// Runs argmin's BFGS with a More-Thuente line search, starting from an
/// identity inverse Hessian. Converges when the gradient norm drops below
/// `tol`.
#[derive(Debug, Clone)]
pub struct Bfgs {
    /// Relative step of the central-difference gradient
    pub diff_step: f64,
}

impl Default for Bfgs {
    fn default() -> Self {
        Self {
            diff_step: f64::EPSILON.cbrt(),
        }
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

impl Minimizer for Bfgs {
    fn minimize<C>(&self, cost: &C, x0: &[f64], max_iter: usize, tol: f64) -> MinimizeResult
    where
        C: CostFunction<Param = Vec<f64>, Output = f64>,
    {
        if let Some(result) = trivial_result(cost, x0, max_iter) {
            return result;
        }

        let start = x0.to_vec();
        let start_cost = cost.cost(&start).unwrap_or(f64::INFINITY);
        let best = RefCell::new(BestPoint::new(start.clone(), start_cost));
        let problem = TrackedProblem::new(cost, &best, self.diff_step);

        let outcome = BFGS::new(MoreThuenteLineSearch::new())
            .with_tolerance_grad(tol)
            .and_then(|solver| {
                Executor::new(problem, solver)
                    .configure(|state| {
                        state
                            .param(start)
                            .inv_hessian(identity(x0.len()))
                            .max_iters(max_iter as u64)
                    })
                    .run()
            });

        let (iterations, converged) = match outcome {
            Ok(result) => {
                let state = result.state();
                trace!(termination = ?state.get_termination_status(), "bfgs finished");
                (
                    state.get_iter() as usize,
                    matches!(
                        state.get_termination_reason(),
                        Some(TerminationReason::SolverConverged)
                    ),
                )
            }
            Err(e) => {
                debug!(error = %e, "bfgs stopped early, keeping best point evaluated");
                (0, false)
            }
        };

        let best = best.into_inner();
        MinimizeResult {
            params: best.params,
            cost: best.cost,
            iterations,
            converged,
        }
    }
}
