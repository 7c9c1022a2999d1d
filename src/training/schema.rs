//! Training configuration schema
//!
//! Mirrors the YAML consumed by the training driver. Every section has
//! defaults so that partial files (and files assembled from `base_config`
//! fragments) deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::depth_pipeline::common::error::{EnsembleError, Result};
use crate::depth_pipeline::ensemble::{AlignmentMode, EnsembleConfig};
use crate::training::schedule::IterExponential;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Referenced YAML fragments merged underneath this file, in order
    #[serde(deserialize_with = "string_or_list")]
    pub base_config: Vec<String>,
    pub pipeline: PipelineSection,
    pub depth_normalization: DepthNormalization,
    pub augmentation: Augmentation,
    pub dataloader: DataloaderConfig,
    pub trainer: TrainerConfig,
    pub multi_res_noise: Option<MultiResNoise>,
    pub gt_depth_type: String,
    pub gt_mask_type: String,
    pub max_epoch: usize,
    pub max_iter: usize,
    pub optimizer: OptimizerConfig,
    pub loss: LossConfig,
    pub lr: f64,
    pub lr_scheduler: LrSchedulerConfig,
    pub validation: ValidationConfig,
    pub eval: EvalConfig,
    pub model: Option<ModelConfig>,
    pub dataset: Option<DatasetConfig>,
    pub logging: Option<LoggingConfig>,
    pub wandb: Option<WandbConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// `base_config` may name a single file or list several.
fn string_or_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(single)) => vec![single],
        Some(OneOrMany::Many(list)) => list,
    })
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            base_config: Vec::new(),
            pipeline: PipelineSection::default(),
            depth_normalization: DepthNormalization::default(),
            augmentation: Augmentation::default(),
            dataloader: DataloaderConfig::default(),
            trainer: TrainerConfig::default(),
            multi_res_noise: None,
            gt_depth_type: "depth_raw_norm".to_string(),
            gt_mask_type: "valid_mask_raw".to_string(),
            max_epoch: 10000,
            max_iter: 30000,
            optimizer: OptimizerConfig::default(),
            loss: LossConfig::default(),
            lr: 3.0e-5,
            lr_scheduler: LrSchedulerConfig::default(),
            validation: ValidationConfig::default(),
            eval: EvalConfig::default(),
            model: None,
            dataset: None,
            logging: None,
            wandb: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub name: String,
    pub kwargs: PipelineKwargs,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: "MarigoldPipeline".to_string(),
            kwargs: PipelineKwargs::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineKwargs {
    pub scale_invariant: bool,
    pub shift_invariant: bool,
}

impl Default for PipelineKwargs {
    fn default() -> Self {
        Self {
            scale_invariant: true,
            shift_invariant: true,
        }
    }
}

/// How ground-truth depth is mapped into the latent range
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepthNormalization {
    #[serde(rename = "type")]
    pub kind: String,
    pub clip: bool,
    pub norm_min: f64,
    pub norm_max: f64,
    /// Quantile used for the robust min/max of each depth map
    pub min_max_quantile: f64,
}

impl Default for DepthNormalization {
    fn default() -> Self {
        Self {
            kind: "scale_shift_depth".to_string(),
            clip: true,
            norm_min: -1.0,
            norm_max: 1.0,
            min_max_quantile: 0.02,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Augmentation {
    pub lr_flip_p: f64,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self { lr_flip_p: 0.5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataloaderConfig {
    pub num_workers: usize,
    pub effective_batch_size: usize,
    pub max_train_batch_size: usize,
    pub seed: u64,
}

impl Default for DataloaderConfig {
    fn default() -> Self {
        Self {
            num_workers: 2,
            effective_batch_size: 32,
            max_train_batch_size: 2,
            seed: 2024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub name: String,
    pub training_noise_scheduler: NoiseSchedulerConfig,
    pub init_seed: u64,
    pub save_period: usize,
    pub backup_period: usize,
    pub validation_period: usize,
    pub visualization_period: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            name: "MarigoldTrainer".to_string(),
            training_noise_scheduler: NoiseSchedulerConfig::default(),
            init_seed: 2024,
            save_period: 50,
            backup_period: 2000,
            validation_period: 2000,
            visualization_period: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoiseSchedulerConfig {
    pub pretrained_path: String,
}

impl Default for NoiseSchedulerConfig {
    fn default() -> Self {
        Self {
            pretrained_path: "stable-diffusion-2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiResNoise {
    pub strength: f64,
    pub annealed: bool,
    pub downscale_strategy: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub name: String,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            name: "Adam".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    pub name: String,
    pub kwargs: BTreeMap<String, Value>,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            name: "mse_loss".to_string(),
            kwargs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LrSchedulerConfig {
    pub name: String,
    pub kwargs: IterExponential,
}

impl Default for LrSchedulerConfig {
    fn default() -> Self {
        Self {
            name: "IterExponential".to_string(),
            kwargs: IterExponential::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricGoal {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub denoising_steps: usize,
    pub ensemble_size: usize,
    /// 0 keeps the input resolution
    pub processing_res: usize,
    pub match_input_res: bool,
    pub resample_method: String,
    pub main_val_metric: String,
    pub main_val_metric_goal: MetricGoal,
    pub init_seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            denoising_steps: 50,
            ensemble_size: 1,
            processing_res: 0,
            match_input_res: false,
            resample_method: "bilinear".to_string(),
            main_val_metric: "abs_relative_difference".to_string(),
            main_val_metric_goal: MetricGoal::Minimize,
            init_seed: 2024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub alignment: String,
    pub align_max_res: Option<usize>,
    pub eval_metrics: Vec<String>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            alignment: "least_square".to_string(),
            align_max_res: None,
            eval_metrics: vec!["abs_relative_difference".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub pretrained_path: String,
    #[serde(default = "default_latent_scale_factor")]
    pub latent_scale_factor: f64,
}

fn default_latent_scale_factor() -> f64 {
    0.18215
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    #[serde(default)]
    pub disp_name: Option<String>,
    pub dir: String,
    pub filenames: String,
    #[serde(default)]
    pub resize_to_hw: Option<[usize; 2]>,
    /// Dataset-specific keys passed through to the loader
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DatasetConfig {
    pub train: Option<DatasetEntry>,
    pub val: Vec<DatasetEntry>,
    pub vis: Vec<DatasetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filename: String,
    #[serde(default)]
    pub format: Option<String>,
    pub console_level: u32,
    pub file_level: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WandbConfig {
    pub project: String,
    #[serde(default)]
    pub entity: Option<String>,
}

impl TrainingConfig {
    /// Checks cross-field constraints the training driver relies on.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EnsembleError::InvalidConfig(msg));

        self.alignment_mode()?;

        let norm = &self.depth_normalization;
        if norm.norm_min >= norm.norm_max {
            return invalid(format!(
                "depth_normalization.norm_min ({}) must be below norm_max ({})",
                norm.norm_min, norm.norm_max
            ));
        }
        if !(0.0..0.5).contains(&norm.min_max_quantile) {
            return invalid(format!(
                "depth_normalization.min_max_quantile must be in [0, 0.5), got {}",
                norm.min_max_quantile
            ));
        }

        let loader = &self.dataloader;
        if loader.max_train_batch_size == 0
            || loader.effective_batch_size == 0
            || loader.effective_batch_size % loader.max_train_batch_size != 0
        {
            return invalid(format!(
                "dataloader.effective_batch_size ({}) must be a positive multiple of max_train_batch_size ({})",
                loader.effective_batch_size, loader.max_train_batch_size
            ));
        }

        if !(self.lr > 0.0) {
            return invalid(format!("lr must be positive, got {}", self.lr));
        }
        self.lr_scheduler.kwargs.validate()?;

        if self.validation.ensemble_size == 0 {
            return invalid("validation.ensemble_size must be at least 1".to_string());
        }
        if self.validation.denoising_steps == 0 {
            return invalid("validation.denoising_steps must be at least 1".to_string());
        }

        Ok(())
    }

    /// Alignment implied by the pipeline's invariance flags.
    pub fn alignment_mode(&self) -> Result<AlignmentMode> {
        let kwargs = &self.pipeline.kwargs;
        AlignmentMode::from_flags(kwargs.scale_invariant, kwargs.shift_invariant)
    }

    /// Micro-batches accumulated per optimizer step.
    pub fn gradient_accumulation_steps(&self) -> usize {
        let loader = &self.dataloader;
        (loader.effective_batch_size / loader.max_train_batch_size.max(1)).max(1)
    }

    /// Learning rate at training iteration `iter`.
    pub fn lr_at(&self, iter: usize) -> f64 {
        self.lr * self.lr_scheduler.kwargs.factor(iter)
    }

    /// Ensembling settings matching the pipeline's invariance flags.
    pub fn ensemble_config(&self) -> EnsembleConfig {
        EnsembleConfig::builder()
            .scale_invariant(self.pipeline.kwargs.scale_invariant)
            .shift_invariant(self.pipeline.kwargs.shift_invariant)
            .build()
    }
}
