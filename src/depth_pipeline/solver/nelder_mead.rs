use std::cell::RefCell;

use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead as SimplexSolver;
use tracing::debug;

use crate::depth_pipeline::solver::minimizer::{
    BestPoint, MinimizeResult, Minimizer, TrackedProblem, trivial_result,
};

/// Downhill-simplex minimizer.
///
/// The initial simplex perturbs one coordinate per vertex. Converges when the
/// standard deviation of the vertex costs falls below `tol`.
#[derive(Debug, Clone)]
pub struct NelderMead {
    /// Relative perturbation of non-zero coordinates in the initial simplex
    pub nonzero_delta: f64,
    /// Absolute perturbation of zero coordinates in the initial simplex
    pub zero_delta: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            nonzero_delta: 0.05,
            zero_delta: 0.00025,
        }
    }
}

impl NelderMead {
    fn initial_simplex(&self, x0: &[f64]) -> Vec<Vec<f64>> {
        let mut vertices = vec![x0.to_vec()];
        for i in 0..x0.len() {
            let mut v = x0.to_vec();
            v[i] = if v[i] != 0.0 {
                (1.0 + self.nonzero_delta) * v[i]
            } else {
                self.zero_delta
            };
            vertices.push(v);
        }
        vertices
    }
}

impl Minimizer for NelderMead {
    fn minimize<C>(&self, cost: &C, x0: &[f64], max_iter: usize, tol: f64) -> MinimizeResult
    where
        C: CostFunction<Param = Vec<f64>, Output = f64>,
    {
        if let Some(result) = trivial_result(cost, x0, max_iter) {
            return result;
        }

        let start_cost = cost.cost(&x0.to_vec()).unwrap_or(f64::INFINITY);
        let best = RefCell::new(BestPoint::new(x0.to_vec(), start_cost));
        // gradient step is unused by the simplex
        let problem = TrackedProblem::new(cost, &best, 0.0);

        let outcome = SimplexSolver::new(self.initial_simplex(x0))
            .with_sd_tolerance(tol)
            .and_then(|solver| {
                Executor::new(problem, solver)
                    .configure(|state| state.max_iters(max_iter as u64))
                    .run()
            });

        let (iterations, converged) = match outcome {
            Ok(result) => {
                let state = result.state();
                (
                    state.get_iter() as usize,
                    matches!(
                        state.get_termination_reason(),
                        Some(TerminationReason::SolverConverged)
                    ),
                )
            }
            Err(e) => {
                debug!(error = %e, "simplex search stopped early, keeping best point evaluated");
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
