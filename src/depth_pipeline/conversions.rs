//! Pipeline conversions module
//!
//! This module contains orchestration logic that turns a set of depth map
//! files into one ensembled depth map.

mod tiff_ensemble;


pub use tiff_ensemble::DepthEnsemblePipeline;
