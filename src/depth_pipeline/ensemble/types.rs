//! Ensembling configuration and result types

use std::fmt;
use std::str::FromStr;

use ndarray::Array4;
use serde::Deserialize;

use crate::depth_pipeline::common::error::{EnsembleError, Result};

/// Floor applied to every range or maximum used as a divisor.
pub const EPSILON: f64 = 1e-6;

/// How the samples of a batch are allowed to differ from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentMode {
    /// Per-sample scale and shift are both free.
    Affine,
    /// Per-sample scale is free, shift is fixed at zero.
    ScaleOnly,
    /// Samples are reduced as they are.
    None,
}

impl AlignmentMode {
    /// Derives the mode from the two invariance flags.
    ///
    /// Shift invariance without scale invariance has no supported alignment
    /// model and is rejected.
    pub fn from_flags(scale_invariant: bool, shift_invariant: bool) -> Result<Self> {
        match (scale_invariant, shift_invariant) {
            (true, true) => Ok(Self::Affine),
            (true, false) => Ok(Self::ScaleOnly),
            (false, false) => Ok(Self::None),
            (false, true) => Err(EnsembleError::UnsupportedAlignment {
                scale_invariant,
                shift_invariant,
            }),
        }
    }

    /// Length of the flat parameter vector for a batch of `batch_size` samples.
    pub fn param_len(self, batch_size: usize) -> usize {
        match self {
            Self::Affine => 2 * batch_size,
            Self::ScaleOnly => batch_size,
            Self::None => 0,
        }
    }

    pub fn requires_alignment(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Per-pixel reduction across the batch dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Reduction {
    /// Mean, paired with the standard deviation as uncertainty.
    Mean,
    /// Median, paired with the mean absolute deviation from the median.
    Median,
}

impl FromStr for Reduction {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(EnsembleError::InvalidReduction(other.to_string())),
        }
    }
}

impl TryFrom<String> for Reduction {
    type Error = EnsembleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => f.write_str("mean"),
            Self::Median => f.write_str("median"),
        }
    }
}

/// Configuration for ensembling a batch of depth predictions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Samples are equivalent up to a multiplicative constant
    pub scale_invariant: bool,
    /// Samples are equivalent up to an additive constant
    pub shift_invariant: bool,
    /// Also return the per-pixel dispersion paired with `reduction`
    pub output_uncertainty: bool,
    pub reduction: Reduction,
    /// Weight of the [0, 1] range term in the alignment cost, 0 disables it
    pub regularizer_strength: f64,
    /// Iteration cap of the minimizer
    pub max_iter: usize,
    /// Convergence tolerance of the minimizer
    pub tol: f64,
    /// Longest spatial side used while solving, `None` solves at full resolution
    pub max_res: Option<usize>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            scale_invariant: true,
            shift_invariant: true,
            output_uncertainty: false,
            reduction: Reduction::Median,
            regularizer_strength: 0.02,
            max_iter: 2,
            tol: 1e-3,
            max_res: Some(1024),
        }
    }
}

impl EnsembleConfig {
    pub fn builder() -> EnsembleConfigBuilder {
        EnsembleConfigBuilder::default()
    }

    /// Checks the configuration and derives the alignment mode.
    pub fn validate(&self) -> Result<AlignmentMode> {
        let mode = AlignmentMode::from_flags(self.scale_invariant, self.shift_invariant)?;

        if !self.regularizer_strength.is_finite() || self.regularizer_strength < 0.0 {
            return Err(EnsembleError::InvalidConfig(format!(
                "regularizer_strength must be a non-negative number, got {}",
                self.regularizer_strength
            )));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(EnsembleError::InvalidConfig(format!(
                "tol must be a non-negative number, got {}",
                self.tol
            )));
        }
        if self.max_res == Some(0) {
            return Err(EnsembleError::InvalidConfig(
                "max_res must be positive or unbounded".to_string(),
            ));
        }

        Ok(mode)
    }
}

/// Builder for EnsembleConfig
#[derive(Default)]
pub struct EnsembleConfigBuilder {
    scale_invariant: Option<bool>,
    shift_invariant: Option<bool>,
    output_uncertainty: Option<bool>,
    reduction: Option<Reduction>,
    regularizer_strength: Option<f64>,
    max_iter: Option<usize>,
    tol: Option<f64>,
    max_res: Option<Option<usize>>,
}

impl EnsembleConfigBuilder {
    pub fn scale_invariant(mut self, enable: bool) -> Self {
        self.scale_invariant = Some(enable);
        self
    }

    pub fn shift_invariant(mut self, enable: bool) -> Self {
        self.shift_invariant = Some(enable);
        self
    }

    pub fn output_uncertainty(mut self, enable: bool) -> Self {
        self.output_uncertainty = Some(enable);
        self
    }

    pub fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = Some(reduction);
        self
    }

    pub fn regularizer_strength(mut self, strength: f64) -> Self {
        self.regularizer_strength = Some(strength);
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn max_res(mut self, max_res: Option<usize>) -> Self {
        self.max_res = Some(max_res);
        self
    }

    pub fn build(self) -> EnsembleConfig {
        let default = EnsembleConfig::default();
        EnsembleConfig {
            scale_invariant: self.scale_invariant.unwrap_or(default.scale_invariant),
            shift_invariant: self.shift_invariant.unwrap_or(default.shift_invariant),
            output_uncertainty: self.output_uncertainty.unwrap_or(default.output_uncertainty),
            reduction: self.reduction.unwrap_or(default.reduction),
            regularizer_strength: self
                .regularizer_strength
                .unwrap_or(default.regularizer_strength),
            max_iter: self.max_iter.unwrap_or(default.max_iter),
            tol: self.tol.unwrap_or(default.tol),
            max_res: self.max_res.unwrap_or(default.max_res),
        }
    }
}

/// Result of ensembling one batch
#[derive(Debug, Clone)]
pub struct EnsembleOutput {
    /// Fused depth map, shape (1, 1, H, W)
    pub prediction: Array4<f32>,
    /// Per-pixel dispersion, shape (1, 1, H, W), present when requested
    pub uncertainty: Option<Array4<f32>>,
    /// Alignment parameters applied to the batch, empty when no alignment ran
    pub params: Vec<f64>,
}
