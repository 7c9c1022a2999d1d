use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};

/// Outcome of a minimization run.
///
/// `params` always holds the best point evaluated, whether the run converged,
/// hit the iteration cap or was stopped by a solver error.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    pub params: Vec<f64>,
    pub cost: f64,
    /// Iterations reported by the solver, 0 when it stopped with an error
    pub iterations: usize,
    pub converged: bool,
}

pub trait Minimizer {
    fn minimize<C>(&self, cost: &C, x0: &[f64], max_iter: usize, tol: f64) -> MinimizeResult
    where
        C: CostFunction<Param = Vec<f64>, Output = f64>;
}

/// Lowest finite cost evaluated so far.
pub(crate) struct BestPoint {
    pub params: Vec<f64>,
    pub cost: f64,
}

impl BestPoint {
    pub fn new(params: Vec<f64>, cost: f64) -> Self {
        Self { params, cost }
    }

    fn offer(&mut self, params: &[f64], cost: f64) {
        if cost.is_finite() && cost < self.cost {
            self.params.clear();
            self.params.extend_from_slice(params);
            self.cost = cost;
        }
    }
}

/// Wraps a cost function so every evaluation is offered to a `BestPoint`,
/// and supplies a central-difference gradient.
pub(crate) struct TrackedProblem<'a, C> {
    cost: &'a C,
    best: &'a RefCell<BestPoint>,
    /// Relative step of the central-difference gradient
    diff_step: f64,
}

impl<'a, C> TrackedProblem<'a, C> {
    pub fn new(cost: &'a C, best: &'a RefCell<BestPoint>, diff_step: f64) -> Self {
        Self { cost, best, diff_step }
    }
}

impl<C> CostFunction for TrackedProblem<'_, C>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.cost.cost(params)?;
        self.best.borrow_mut().offer(params, value);
        Ok(value)
    }
}

impl<C> Gradient for TrackedProblem<'_, C>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut shifted = params.clone();
        let mut gradient = Vec::with_capacity(params.len());
        for i in 0..params.len() {
            let h = self.diff_step * params[i].abs().max(1.0);
            shifted[i] = params[i] + h;
            let forward = self.cost(&shifted)?;
            shifted[i] = params[i] - h;
            let backward = self.cost(&shifted)?;
            shifted[i] = params[i];
            gradient.push((forward - backward) / (2.0 * h));
        }
        Ok(gradient)
    }
}

/// Result for inputs that need no solver run: an empty parameter vector
/// or a zero iteration budget.
pub(crate) fn trivial_result<C>(cost: &C, x0: &[f64], max_iter: usize) -> Option<MinimizeResult>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    if !x0.is_empty() && max_iter > 0 {
        return None;
    }
    let params = x0.to_vec();
    let value = cost.cost(&params).unwrap_or(f64::INFINITY);
    Some(MinimizeResult {
        params,
        cost: value,
        iterations: 0,
        converged: x0.is_empty(),
    })
}
