use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use marigold_ensemble_rs::depth_pipeline::{
    DepthEnsemblePipeline, EnsembleConfig, OutputConfig, Reduction, SampleFormat,
    TiffCompression,
};
use marigold_ensemble_rs::logger;
use marigold_ensemble_rs::training::load_training_config_with_base_dir;

use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "marigold-ensemble", version, about = "Test-time ensembling of affine-invariant depth maps")]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fuse several single-channel depth TIFFs into one
    Ensemble(EnsembleArgs),
    /// Load, merge and validate a training configuration
    CheckConfig {
        config: PathBuf,
        /// Directory `base_config` entries are resolved against
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
}

#[derive(Args)]
struct EnsembleArgs {
    /// Depth predictions of the same image
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[arg(short, long)]
    output: PathBuf,

    /// Also write the per-pixel uncertainty here
    #[arg(long)]
    uncertainty: Option<PathBuf>,

    /// YAML file with ensemble settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// mean or median
    #[arg(long)]
    reduction: Option<Reduction>,

    #[arg(long)]
    no_scale_invariant: bool,

    #[arg(long)]
    no_shift_invariant: bool,

    #[arg(long)]
    max_iter: Option<usize>,

    #[arg(long)]
    tol: Option<f64>,

    /// Longest side used while solving, 0 solves at full resolution
    #[arg(long)]
    max_res: Option<usize>,

    #[arg(long)]
    regularizer: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::F32)]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    F32,
    U16,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl From<Compression> for TiffCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::DeflateFast => TiffCompression::DeflateFast,
            Compression::DeflateBalanced => TiffCompression::DeflateBalanced,
            Compression::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_with_default(if cli.verbose { "debug" } else { "info" });

    match cli.command {
        Command::Ensemble(args) => run_ensemble(args),
        Command::CheckConfig { config, base_dir } => check_config(&config, &base_dir),
    }
}

fn load_ensemble_config(path: &Path) -> anyhow::Result<EnsembleConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading ensemble config {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("parsing ensemble config {}", path.display()))
}

fn run_ensemble(args: EnsembleArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => load_ensemble_config(path)?,
        None => EnsembleConfig::default(),
    };

    if let Some(reduction) = args.reduction {
        config.reduction = reduction;
    }
    if args.no_scale_invariant {
        config.scale_invariant = false;
    }
    if args.no_shift_invariant {
        config.shift_invariant = false;
    }
    if let Some(max_iter) = args.max_iter {
        config.max_iter = max_iter;
    }
    if let Some(tol) = args.tol {
        config.tol = tol;
    }
    if let Some(max_res) = args.max_res {
        config.max_res = (max_res > 0).then_some(max_res);
    }
    if let Some(strength) = args.regularizer {
        config.regularizer_strength = strength;
    }
    config.output_uncertainty = config.output_uncertainty || args.uncertainty.is_some();

    if args.inputs.len() == 1 {
        warn!("Only one input given; the output is that map, normalized");
    }

    let sample_format = match args.format {
        OutputFormat::F32 => SampleFormat::Float32,
        OutputFormat::U16 => SampleFormat::Gray16,
    };
    let output_config = OutputConfig::builder()
        .compression(args.compression.into())
        .sample_format(sample_format)
        .build();

    info!(
        inputs = args.inputs.len(),
        reduction = %config.reduction,
        scale_invariant = config.scale_invariant,
        shift_invariant = config.shift_invariant,
        "Ensemble settings"
    );

    let pipeline = DepthEnsemblePipeline::new(config, output_config);
    pipeline
        .ensemble_files(&args.inputs, &args.output, args.uncertainty.as_deref())
        .with_context(|| format!("ensembling into {}", args.output.display()))?;

    info!(output = %args.output.display(), "Done");
    Ok(())
}

fn check_config(path: &Path, base_dir: &Path) -> anyhow::Result<()> {
    let config = load_training_config_with_base_dir(path, base_dir)
        .with_context(|| format!("loading {}", path.display()))?;

    if let Err(e) = config.validate() {
        bail!("{} is invalid: {}", path.display(), e);
    }

    info!(
        pipeline = %config.pipeline.name,
        alignment = ?config.alignment_mode()?,
        effective_batch_size = config.dataloader.effective_batch_size,
        gradient_accumulation_steps = config.gradient_accumulation_steps(),
        max_iter = config.max_iter,
        lr = config.lr,
        final_lr = config.lr_at(config.max_iter),
        "Configuration is valid"
    );
    Ok(())
}
