pub mod depth_pipeline;
pub mod logger;
pub mod training;
