//! Depth map and TIFF output configuration types

use ndarray::{Array4, ArrayView2, ArrayView4, Axis};
use serde::Deserialize;

use crate::depth_pipeline::common::error::{EnsembleError, Result};

/// Single-channel depth map in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    /// Width of the map in pixels
    pub width: usize,
    /// Height of the map in pixels
    pub height: usize,
    /// Depth values, `width * height` entries
    pub data: Vec<f32>,
}

impl DepthMap {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(EnsembleError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height, data })
    }

    /// Takes the first sample and channel of a (N, C, H, W) array.
    pub fn from_nchw(array: ArrayView4<'_, f32>) -> Result<Self> {
        let (_, _, height, width) = array.dim();
        if array.is_empty() {
            return Err(EnsembleError::InvalidDimensions(width, height));
        }
        let plane: ArrayView2<'_, f32> = array.index_axis(Axis(0), 0).index_axis_move(Axis(0), 0);
        Self::new(width, height, plane.iter().copied().collect())
    }

    /// Stacks same-sized maps into a (N, 1, H, W) batch.
    pub fn stack(maps: &[DepthMap]) -> Result<Array4<f32>> {
        let first = maps.first().ok_or_else(|| {
            EnsembleError::InvalidShape("cannot stack an empty list of depth maps".to_string())
        })?;
        let (width, height) = (first.width, first.height);

        let mut data = Vec::with_capacity(maps.len() * width * height);
        for (index, map) in maps.iter().enumerate() {
            if map.width != width || map.height != height {
                return Err(EnsembleError::DimensionMismatch {
                    index,
                    width: map.width,
                    height: map.height,
                    expected_width: width,
                    expected_height: height,
                });
            }
            data.extend_from_slice(&map.data);
        }

        Array4::from_shape_vec((maps.len(), 1, height, width), data)
            .map_err(|e| EnsembleError::InvalidShape(e.to_string()))
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// Sample encoding of written depth maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// 32-bit float, values written as they are
    Float32,
    /// 16-bit unsigned, values clamped to [0, 1] and scaled by 65535
    Gray16,
}

/// Configuration for writing depth maps
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    /// Only applied to 16-bit output
    pub predictor: Option<u16>,
    pub sample_format: SampleFormat,
    /// Whether to validate map dimensions before writing
    pub validate_dimensions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
            sample_format: SampleFormat::Float32,
            validate_dimensions: true,
        }
    }
}

impl OutputConfig {
    pub fn builder() -> OutputConfigBuilder {
        OutputConfigBuilder::default()
    }
}

/// Builder for OutputConfig
#[derive(Default)]
pub struct OutputConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    sample_format: Option<SampleFormat>,
    validate_dimensions: Option<bool>,
}

impl OutputConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn sample_format(mut self, format: SampleFormat) -> Self {
        self.sample_format = Some(format);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> OutputConfig {
        let default = OutputConfig::default();
        OutputConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            sample_format: self.sample_format.unwrap_or(default.sample_format),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}
