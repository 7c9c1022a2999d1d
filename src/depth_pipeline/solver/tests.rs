use argmin::core::Error;

use crate::depth_pipeline::solver::{Bfgs, CostFunction, Minimizer, NelderMead};

struct Bowl {
    center: Vec<f64>,
}

impl CostFunction for Bowl {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Vec<f64>) -> Result<f64, Error> {
        Ok(params
            .iter()
            .zip(&self.center)
            .map(|(p, c)| (p - c).powi(2))
            .sum())
    }
}

struct Rosenbrock;

impl Rosenbrock {
    fn value(p: &[f64]) -> f64 {
        (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2)
    }
}

impl CostFunction for Rosenbrock {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Vec<f64>) -> Result<f64, Error> {
        Ok(Self::value(p))
    }
}

/// Fails every evaluation away from the start point.
struct Cliff;

impl CostFunction for Cliff {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Vec<f64>) -> Result<f64, Error> {
        if p[0] == 2.0 {
            Ok(4.0)
        } else {
            Err(Error::msg("outside the domain"))
        }
    }
}

fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < tol, "expected {:?}, got {:?}", expected, actual);
    }
}

#[test]
fn test_bfgs_quadratic_bowl() {
    let bowl = Bowl { center: vec![0.5, -2.0, 3.0] };
    let result = Bfgs::default().minimize(&bowl, &[0.0, 0.0, 0.0], 100, 1e-6);

    assert_close(&result.params, &bowl.center, 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_bfgs_rosenbrock() {
    let result = Bfgs::default().minimize(&Rosenbrock, &[-1.2, 1.0], 500, 1e-5);

    assert_close(&result.params, &[1.0, 1.0], 1e-3);
}

#[test]
fn test_bfgs_iteration_cap_keeps_best() {
    let x0 = [-1.2, 1.0];
    let start_cost = Rosenbrock::value(&x0);
    let result = Bfgs::default().minimize(&Rosenbrock, &x0, 2, 1e-12);

    assert!(result.iterations <= 2);
    assert!(!result.converged);
    assert!(result.cost < start_cost);
    assert!((Rosenbrock::value(&result.params) - result.cost).abs() < 1e-12);
}

#[test]
fn test_bfgs_zero_iterations_returns_start() {
    let bowl = Bowl { center: vec![1.0, 1.0] };
    let result = Bfgs::default().minimize(&bowl, &[3.0, -3.0], 0, 1e-6);

    assert_eq!(result.params, vec![3.0, -3.0]);
    assert_eq!(result.iterations, 0);
}

#[test]
fn test_empty_parameter_vector() {
    let bowl = Bowl { center: vec![] };

    let result = Bfgs::default().minimize(&bowl, &[], 10, 1e-6);
    assert!(result.params.is_empty());
    assert!(result.converged);

    let result = NelderMead::default().minimize(&bowl, &[], 10, 1e-6);
    assert!(result.params.is_empty());
    assert!(result.converged);
}

#[test]
fn test_nelder_mead_quadratic_bowl() {
    let bowl = Bowl { center: vec![2.0, -1.0] };
    let result = NelderMead::default().minimize(&bowl, &[0.0, 0.0], 1000, 1e-10);

    assert_close(&result.params, &bowl.center, 1e-3);
    assert!(result.converged);
}

#[test]
fn test_nelder_mead_rosenbrock() {
    let result = NelderMead::default().minimize(&Rosenbrock, &[-1.2, 1.0], 2000, 1e-10);

    assert_close(&result.params, &[1.0, 1.0], 1e-3);
}

#[test]
fn test_minimizers_are_deterministic() {
    let a = Bfgs::default().minimize(&Rosenbrock, &[-1.2, 1.0], 20, 1e-6);
    let b = Bfgs::default().minimize(&Rosenbrock, &[-1.2, 1.0], 20, 1e-6);
    assert_eq!(a.params, b.params);

    let a = NelderMead::default().minimize(&Rosenbrock, &[-1.2, 1.0], 50, 1e-6);
    let b = NelderMead::default().minimize(&Rosenbrock, &[-1.2, 1.0], 50, 1e-6);
    assert_eq!(a.params, b.params);
}

#[test]
fn test_solver_error_keeps_start_point() {
    let result = Bfgs::default().minimize(&Cliff, &[2.0], 10, 1e-6);
    assert_eq!(result.params, vec![2.0]);
    assert_eq!(result.cost, 4.0);
    assert!(!result.converged);

    let result = NelderMead::default().minimize(&Cliff, &[2.0], 10, 1e-6);
    assert_eq!(result.params, vec![2.0]);
    assert!(!result.converged);
}

#[test]
fn test_bfgs_reports_convergence() {
    let bowl = Bowl { center: vec![1.0, -1.0] };
    let result = Bfgs::default().minimize(&bowl, &[0.0, 0.0], 100, 1e-4);

    assert!(result.converged);
    assert!(result.iterations < 100);
    assert_close(&result.params, &bowl.center, 1e-4);
}
