//! Spatial resampling of depth batches
//!
//! Used to bound the resolution the alignment solver works at and to compute
//! processing sizes for input images.

mod resampler;
mod interpolation_resampler;
pub mod types;

#[cfg(test)]
mod tests;

pub use resampler::{Resampler, max_res_dims, resize_max_res};
pub use interpolation_resampler::InterpolationResampler;
pub use types::ResampleMethod;
