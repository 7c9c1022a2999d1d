//! TIFF depth map I/O
//!
//! Depth predictions are exchanged as single-channel TIFF files. The reader
//! accepts integer and floating-point samples; the writer emits 32-bit float
//! or 16-bit normalized maps with optional compression.

mod reader;
mod writer;
mod standard_tiff_reader;
mod standard_tiff_writer;
pub mod types;

#[cfg(test)]
mod tests;

pub use reader::DepthMapReader;
pub use writer::DepthMapWriter;
pub use standard_tiff_reader::StandardTiffReader;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{DepthMap, OutputConfig, OutputConfigBuilder, SampleFormat, TiffCompression};
