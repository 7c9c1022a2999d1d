use serde::Deserialize;

use crate::depth_pipeline::common::error::{EnsembleError, Result};

/// Learning-rate factor with linear warmup followed by exponential decay.
///
/// The factor rises linearly from 0 over `warmup_steps`, then decays as
/// `final_ratio^((iter - warmup_steps) / total_iter)` and stays at
/// `final_ratio` from `total_iter` on.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IterExponential {
    pub total_iter: usize,
    pub final_ratio: f64,
    pub warmup_steps: usize,
}

impl Default for IterExponential {
    fn default() -> Self {
        Self {
            total_iter: 25000,
            final_ratio: 0.01,
            warmup_steps: 100,
        }
    }
}

impl IterExponential {
    pub fn validate(&self) -> Result<()> {
        if self.total_iter == 0 {
            return Err(EnsembleError::InvalidConfig(
                "lr_scheduler.kwargs.total_iter must be positive".to_string(),
            ));
        }
        if !(self.final_ratio > 0.0 && self.final_ratio <= 1.0) {
            return Err(EnsembleError::InvalidConfig(format!(
                "lr_scheduler.kwargs.final_ratio must be in (0, 1], got {}",
                self.final_ratio
            )));
        }
        Ok(())
    }

    pub fn factor(&self, iter: usize) -> f64 {
        if self.warmup_steps > 0 && iter < self.warmup_steps {
            iter as f64 / self.warmup_steps as f64
        } else if iter >= self.total_iter {
            self.final_ratio
        } else {
            let progress = (iter - self.warmup_steps) as f64 / self.total_iter as f64;
            (progress * self.final_ratio.ln()).exp()
        }
    }
}
