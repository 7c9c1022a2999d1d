//! Depth ensembling pipeline module
//!
//! This module provides test-time ensembling of depth predictions together
//! with the pieces around it: numerical solvers, resampling, TIFF depth map
//! I/O and file-level orchestration.

pub mod common;
pub mod ensemble;
pub mod solver;
pub mod resize;
pub mod tiff;
pub mod conversions;
pub mod batch_size;

pub use common::{
    EnsembleError,
    Result,
};

pub use ensemble::{
    AlignmentMode,
    DepthEnsembler,
    EnsembleConfig,
    EnsembleConfigBuilder,
    EnsembleOutput,
    Reduction,
    ensemble_depth,
};

pub use solver::{
    Bfgs,
    CostFunction,
    MinimizeResult,
    Minimizer,
    NelderMead,
};

pub use resize::{
    InterpolationResampler,
    ResampleMethod,
    Resampler,
};

pub use tiff::{
    DepthMap,
    DepthMapReader,
    DepthMapWriter,
    OutputConfig,
    OutputConfigBuilder,
    SampleFormat,
    StandardTiffReader,
    StandardTiffWriter,
    TiffCompression,
};

pub use conversions::{
    DepthEnsemblePipeline,
};

pub use batch_size::{InferenceDtype, find_batch_size};
