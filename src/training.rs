//! Training configuration
//!
//! YAML files may pull in shared fragments through `base_config`; see
//! [`load_training_config`].

mod loader;
mod schedule;
mod schema;


pub use loader::{load_training_config, load_training_config_with_base_dir};
pub use schedule::IterExponential;
pub use schema::{
    Augmentation, DataloaderConfig, DatasetConfig, DatasetEntry, DepthNormalization, EvalConfig,
    LoggingConfig, LossConfig, LrSchedulerConfig, MetricGoal, ModelConfig, MultiResNoise,
    NoiseSchedulerConfig, OptimizerConfig, PipelineKwargs, PipelineSection, TrainerConfig,
    TrainingConfig, ValidationConfig, WandbConfig,
};
