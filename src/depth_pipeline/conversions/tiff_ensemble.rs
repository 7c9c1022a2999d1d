use tracing::{info, instrument, warn};
use std::io::Write;
use std::path::Path;

use crate::depth_pipeline::{
    common::error::{EnsembleError, Result},
    ensemble::{DepthEnsembler, EnsembleConfig, EnsembleOutput},
    resize::InterpolationResampler,
    solver::Bfgs,
    tiff::{
        DepthMap, DepthMapReader, DepthMapWriter, OutputConfig, SampleFormat, StandardTiffReader,
        StandardTiffWriter,
    },
};

pub struct DepthEnsemblePipeline<R: DepthMapReader, W: DepthMapWriter> {
    reader: R,
    writer: W,
    ensembler: DepthEnsembler<Bfgs, InterpolationResampler>,
    output_config: OutputConfig,
}

impl DepthEnsemblePipeline<StandardTiffReader, StandardTiffWriter> {
    pub fn new(ensemble_config: EnsembleConfig, output_config: OutputConfig) -> Self {
        Self {
            reader: StandardTiffReader,
            writer: StandardTiffWriter,
            ensembler: DepthEnsembler::new(ensemble_config),
            output_config,
        }
    }
}

impl<R: DepthMapReader, W: DepthMapWriter> DepthEnsemblePipeline<R, W> {
    pub fn with_custom(
        reader: R,
        writer: W,
        ensemble_config: EnsembleConfig,
        output_config: OutputConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            ensembler: DepthEnsembler::new(ensemble_config),
            output_config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.output_config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(EnsembleError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Decodes every input, ensembles them and writes the fused map.
    ///
    /// The uncertainty map, when both computed and asked for, is always
    /// written as 32-bit float since it is not normalized.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn ensemble<B: AsRef<[u8]>>(
        &self,
        inputs: &[B],
        output: &mut dyn Write,
        uncertainty_output: Option<&mut dyn Write>,
    ) -> Result<EnsembleOutput> {
        info!("Starting depth ensembling");

        let maps = {
            let _span = tracing::info_span!("decode_depth_maps").entered();
            inputs
                .iter()
                .map(|data| self.reader.read_depth(data.as_ref()))
                .collect::<Result<Vec<DepthMap>>>()?
        };

        let batch = {
            let _span = tracing::info_span!("stack_depth_maps").entered();
            for map in &maps {
                self.validate_dimensions(map.width, map.height)?;
            }
            DepthMap::stack(&maps)?
        };

        let result = self.ensembler.ensemble(batch.view().into_dyn())?;

        {
            let _span = tracing::info_span!("encode_prediction").entered();
            let prediction = DepthMap::from_nchw(result.prediction.view())?;
            self.writer.write_depth(&prediction, output, &self.output_config)?;
        }

        if let Some(sink) = uncertainty_output {
            match &result.uncertainty {
                Some(uncertainty) => {
                    let _span = tracing::info_span!("encode_uncertainty").entered();
                    let map = DepthMap::from_nchw(uncertainty.view())?;
                    let config = OutputConfig {
                        sample_format: SampleFormat::Float32,
                        ..self.output_config.clone()
                    };
                    self.writer.write_depth(&map, sink, &config)?;
                }
                None => warn!("Uncertainty output requested but output_uncertainty is disabled"),
            }
        }

        let (_, _, height, width) = result.prediction.dim();
        info!(width, height, samples = maps.len(), "Ensembling complete");
        Ok(result)
    }

    #[instrument(skip(self, input_paths, output_path, uncertainty_path))]
    pub fn ensemble_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_paths: &[P],
        output_path: Q,
        uncertainty_path: Option<&Path>,
    ) -> Result<EnsembleOutput> {
        let output_path = output_path.as_ref();

        info!(
            inputs = input_paths.len(),
            output = %output_path.display(),
            "Ensembling files"
        );

        let inputs = {
            let _span = tracing::info_span!("read_input_files").entered();
            input_paths
                .iter()
                .map(|path| {
                    let path = path.as_ref();
                    std::fs::read(path).map_err(|e| {
                        EnsembleError::InputReadError(format!("{}: {}", path.display(), e))
                    })
                })
                .collect::<Result<Vec<Vec<u8>>>>()?
        };

        // encode into memory so a failed run leaves no partial files behind
        let mut output_buffer: Vec<u8> = Vec::new();
        let mut uncertainty_buffer = uncertainty_path.map(|_| Vec::<u8>::new());

        let result = self.ensemble(
            &inputs,
            &mut output_buffer,
            uncertainty_buffer.as_mut().map(|b| b as &mut dyn Write),
        )?;

        {
            let _span = tracing::info_span!("write_output_files").entered();
            persist(output_path, &output_buffer)?;
            if let (Some(path), Some(buffer), Some(_)) =
                (uncertainty_path, &uncertainty_buffer, &result.uncertainty)
            {
                persist(path, buffer)?;
            }
        }

        Ok(result)
    }

    pub fn ensemble_config(&self) -> &EnsembleConfig {
        self.ensembler.config()
    }

    pub fn set_ensemble_config(&mut self, config: EnsembleConfig) {
        self.ensembler.set_config(config);
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output_config
    }

    pub fn set_output_config(&mut self, config: OutputConfig) {
        self.output_config = config;
    }
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| EnsembleError::OutputWriteError(format!("{}: {}", path.display(), e)))
}
