use crate::depth_pipeline::common::error::Result;
use crate::depth_pipeline::tiff::types::DepthMap;

pub trait DepthMapReader {
    fn read_depth(&self, data: &[u8]) -> Result<DepthMap>;
}
