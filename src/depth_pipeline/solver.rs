//! Multivariate minimization for the alignment stage
//!
//! The alignment stage only depends on the `Minimizer` trait. Both
//! implementations drive `argmin` solvers: BFGS on finite-difference
//! gradients is the default, Nelder-Mead is a gradient-free alternative.

mod minimizer;
mod bfgs;
mod nelder_mead;

#[cfg(test)]
mod tests;

pub use argmin::core::CostFunction;
pub use minimizer::{MinimizeResult, Minimizer};
pub use bfgs::Bfgs;
pub use nelder_mead::NelderMead;
