//! Test-time ensembling of depth predictions
//!
//! Repeated diffusion sampling of one image yields predictions that agree only
//! up to a per-sample scale (and shift). This module estimates those affine
//! parameters by minimizing the pairwise disagreement of the samples, then
//! fuses the aligned samples with a mean or median.

mod cost;
mod ensembler;
mod params;
mod reduce;
pub mod types;


pub use cost::AlignmentCost;
pub use ensembler::{DepthEnsembler, ensemble_depth, validate_batch};
pub use params::{apply_alignment, initialize_params, sample_ranges};
pub use reduce::{normalize_min_max, reduce, value_range};
pub use types::{
    AlignmentMode, EPSILON, EnsembleConfig, EnsembleConfigBuilder, EnsembleOutput, Reduction,
};
