use std::io::Write;
use crate::depth_pipeline::common::error::Result;
use crate::depth_pipeline::tiff::types::{DepthMap, OutputConfig};

pub trait DepthMapWriter {
    fn write_depth(&self, map: &DepthMap, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
}
