//! Depth map reader backed by the `tiff` crate.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::depth_pipeline::common::error::{EnsembleError, Result};
use crate::depth_pipeline::tiff::reader::DepthMapReader;
use crate::depth_pipeline::tiff::types::DepthMap;

/// Reads single-channel TIFF depth maps.
///
/// Integer samples are converted to f32 without rescaling, so a 16-bit map
/// keeps its raw code values.
pub struct StandardTiffReader;

impl DepthMapReader for StandardTiffReader {
    fn read_depth(&self, data: &[u8]) -> Result<DepthMap> {
        debug!("Decoding TIFF depth map, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| EnsembleError::DecodeError(e.to_string()))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| EnsembleError::DecodeError(e.to_string()))?;
        let color_type = decoder
            .colortype()
            .map_err(|e| EnsembleError::DecodeError(e.to_string()))?;
        if !matches!(color_type, ColorType::Gray(_)) {
            return Err(EnsembleError::UnsupportedFormat(format!(
                "expected a single-channel depth map, got {:?}",
                color_type
            )));
        }

        let samples: Vec<f32> = match decoder
            .read_image()
            .map_err(|e| EnsembleError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(values) => values.into_iter().map(f32::from).collect(),
            DecodingResult::U16(values) => values.into_iter().map(f32::from).collect(),
            DecodingResult::U32(values) => values.into_iter().map(|v| v as f32).collect(),
            DecodingResult::F32(values) => values,
            DecodingResult::F64(values) => values.into_iter().map(|v| v as f32).collect(),
            _ => {
                return Err(EnsembleError::UnsupportedFormat(format!(
                    "unsupported sample type for {:?}",
                    color_type
                )));
            }
        };

        debug!("Decoded depth map: {}x{}", width, height);
        DepthMap::new(width as usize, height as usize, samples)
    }
}
