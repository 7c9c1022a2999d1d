use std::io::Write;
use tracing::debug;
use crate::depth_pipeline::common::error::{Result, EnsembleError};
use crate::depth_pipeline::tiff::types::{DepthMap, OutputConfig, SampleFormat, TiffCompression};
use crate::depth_pipeline::tiff::writer::DepthMapWriter;

pub struct StandardTiffWriter;

impl DepthMapWriter for StandardTiffWriter {
    fn write_depth(&self, map: &DepthMap, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!("Encoding TIFF depth map: {}x{} as {:?}", map.width, map.height, config.sample_format);

        let mut buffer = Vec::new();

        {
            let compression = match config.compression {
                TiffCompression::None => tiff::encoder::Compression::Uncompressed,
                TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
                TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
                TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
                TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
            };

            let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
                .map_err(|e| EnsembleError::EncodeError(e.to_string()))?
                .with_compression(compression);

            match config.sample_format {
                SampleFormat::Float32 => {
                    encoder.write_image::<tiff::encoder::colortype::Gray32Float>(
                        map.width as u32,
                        map.height as u32,
                        &map.data,
                    ).map_err(|e| EnsembleError::EncodeError(e.to_string()))?;
                }
                SampleFormat::Gray16 => {
                    if let Some(predictor_val) = config.predictor {
                        let predictor = match predictor_val {
                            2 => tiff::tags::Predictor::Horizontal,
                            _ => tiff::tags::Predictor::None,
                        };
                        encoder = encoder.with_predictor(predictor);
                    }

                    let quantized: Vec<u16> = map
                        .data
                        .iter()
                        .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
                        .collect();
                    encoder.write_image::<tiff::encoder::colortype::Gray16>(
                        map.width as u32,
                        map.height as u32,
                        &quantized,
                    ).map_err(|e| EnsembleError::EncodeError(e.to_string()))?;
                }
            }
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
