use ndarray::{Array4, ArrayView4, ArrayViewD, Ix4};
use tracing::{debug, info, instrument};

use crate::depth_pipeline::{
    common::error::{EnsembleError, Result},
    ensemble::cost::AlignmentCost,
    ensemble::params::{align, initialize_params},
    ensemble::reduce::{normalize_min_max, reduce},
    ensemble::types::{AlignmentMode, EnsembleConfig, EnsembleOutput},
    resize::{InterpolationResampler, ResampleMethod, Resampler, resize_max_res},
    solver::{Bfgs, Minimizer},
};

/// Checks that `depth` is a non-empty (B, 1, H, W) batch and widens it to f64.
pub fn validate_batch(depth: ArrayViewD<'_, f32>) -> Result<Array4<f64>> {
    let shape = depth.shape().to_vec();
    if shape.len() != 4 {
        return Err(EnsembleError::InvalidShape(format!(
            "expected 4 dimensions (B, 1, H, W), got {} with shape {:?}",
            shape.len(),
            shape
        )));
    }
    if shape[1] != 1 {
        return Err(EnsembleError::InvalidShape(format!(
            "expected a single channel in dimension 1, got shape {:?}",
            shape
        )));
    }
    if shape.contains(&0) {
        return Err(EnsembleError::InvalidShape(format!(
            "batch, height and width must be non-empty, got shape {:?}",
            shape
        )));
    }

    let batch = depth
        .into_dimensionality::<Ix4>()
        .map_err(|e| EnsembleError::InvalidShape(e.to_string()))?;
    Ok(batch.mapv(f64::from))
}

/// Fuses repeated depth predictions of one scene into a single map.
pub struct DepthEnsembler<M: Minimizer, R: Resampler> {
    minimizer: M,
    resampler: R,
    config: EnsembleConfig,
}

impl DepthEnsembler<Bfgs, InterpolationResampler> {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            minimizer: Bfgs::default(),
            resampler: InterpolationResampler,
            config,
        }
    }
}

impl<M: Minimizer, R: Resampler> DepthEnsembler<M, R> {
    pub fn with_custom(minimizer: M, resampler: R, config: EnsembleConfig) -> Self {
        Self {
            minimizer,
            resampler,
            config,
        }
    }

    /// Aligns and reduces a (B, 1, H, W) batch.
    ///
    /// Configuration is checked before the batch is looked at. When the
    /// samples were aligned the prediction is rescaled to span [0, 1]; without
    /// alignment it is the raw reduction. The uncertainty map is never
    /// rescaled.
    #[instrument(skip_all, fields(shape = ?depth.shape()))]
    pub fn ensemble(&self, depth: ArrayViewD<'_, f32>) -> Result<EnsembleOutput> {
        let mode = self.config.validate()?;

        let batch = {
            let _span = tracing::info_span!("validate_batch").entered();
            validate_batch(depth)?
        };
        let (batch_size, _, height, width) = batch.dim();
        info!(batch_size, height, width, ?mode, reduction = %self.config.reduction, "Ensembling depth batch");

        let params = if mode.requires_alignment() {
            let initial = {
                let _span = tracing::info_span!("initialize_params").entered();
                initialize_params(batch.view(), mode)
            };
            let _span = tracing::info_span!("solve_alignment").entered();
            self.solve(batch.view(), &initial, mode)
        } else {
            Vec::new()
        };

        let aligned = {
            let _span = tracing::info_span!("apply_alignment").entered();
            align(batch.view(), &params, mode)
        };

        let (mut prediction, uncertainty) = {
            let _span = tracing::info_span!("reduce").entered();
            reduce(
                aligned.view(),
                self.config.reduction,
                self.config.output_uncertainty,
            )
        };

        if mode.requires_alignment() {
            let _span = tracing::info_span!("normalize").entered();
            normalize_min_max(&mut prediction);
        }

        Ok(EnsembleOutput {
            prediction: prediction.mapv(|v| v as f32),
            uncertainty: uncertainty.map(|u| u.mapv(|v| v as f32)),
            params,
        })
    }

    /// Refines `initial` against the pairwise-consistency cost, on a copy of
    /// the batch bounded by `max_res` when configured.
    fn solve(&self, batch: ArrayView4<'_, f64>, initial: &[f64], mode: AlignmentMode) -> Vec<f64> {
        let solve_batch = match self.config.max_res {
            Some(max_res) => {
                resize_max_res(&self.resampler, batch, max_res, ResampleMethod::NearestExact)
            }
            None => batch.to_owned(),
        };

        let cost = AlignmentCost::new(
            solve_batch.view(),
            mode,
            self.config.reduction,
            self.config.regularizer_strength,
        );
        let result = self
            .minimizer
            .minimize(&cost, initial, self.config.max_iter, self.config.tol);

        if result.converged {
            debug!(iterations = result.iterations, cost = result.cost, "Alignment converged");
        } else {
            debug!(
                iterations = result.iterations,
                cost = result.cost,
                "Alignment stopped before reaching tolerance, using best parameters"
            );
        }
        result.params
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EnsembleConfig) {
        self.config = config;
    }
}

/// Ensembles `depth` with the default minimizer and resampler.
pub fn ensemble_depth(depth: ArrayViewD<'_, f32>, config: &EnsembleConfig) -> Result<EnsembleOutput> {
    DepthEnsembler::new(config.clone()).ensemble(depth)
}
