//! Per-sample affine parameters: initial guess and application.
//!
//! The flat parameter vector holds all scales first, then all shifts when the
//! mode has a shift term: `[s_0, .., s_{B-1}, t_0, .., t_{B-1}]`.

use ndarray::{Array4, ArrayView4, Axis};

use crate::depth_pipeline::common::error::{EnsembleError, Result};
use crate::depth_pipeline::ensemble::types::{AlignmentMode, EPSILON};

/// Minimum and maximum of every sample over its spatial extent.
pub fn sample_ranges(batch: ArrayView4<'_, f64>) -> Vec<(f64, f64)> {
    batch
        .outer_iter()
        .map(|sample| {
            sample.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        })
        .collect()
}

/// Initial parameters mapping each sample's empirical range onto roughly [0, 1].
pub fn initialize_params(batch: ArrayView4<'_, f64>, mode: AlignmentMode) -> Vec<f64> {
    let ranges = sample_ranges(batch);

    match mode {
        AlignmentMode::Affine => {
            let scales: Vec<f64> = ranges
                .iter()
                .map(|&(min, max)| 1.0 / (max - min).max(EPSILON))
                .collect();
            let shifts = ranges
                .iter()
                .zip(&scales)
                .map(|(&(min, _), &scale)| -min * scale);
            scales.iter().copied().chain(shifts).collect()
        }
        AlignmentMode::ScaleOnly => ranges
            .iter()
            .map(|&(_, max)| 1.0 / max.max(EPSILON))
            .collect(),
        AlignmentMode::None => Vec::new(),
    }
}

/// Applies `depth * scale (+ shift)` to every sample of the batch.
pub fn apply_alignment(
    batch: ArrayView4<'_, f64>,
    params: &[f64],
    mode: AlignmentMode,
) -> Result<Array4<f64>> {
    let expected = mode.param_len(batch.len_of(Axis(0)));
    if params.len() != expected {
        return Err(EnsembleError::InvalidConfig(format!(
            "expected {} alignment parameters for {:?} mode, got {}",
            expected,
            mode,
            params.len()
        )));
    }
    Ok(align(batch, params, mode))
}

/// Unchecked variant used on the solver's hot path, where the length is fixed
/// by the initializer.
pub(crate) fn align(batch: ArrayView4<'_, f64>, params: &[f64], mode: AlignmentMode) -> Array4<f64> {
    let batch_size = batch.len_of(Axis(0));
    let mut aligned = batch.to_owned();

    if mode == AlignmentMode::None {
        return aligned;
    }

    for (i, mut sample) in aligned.outer_iter_mut().enumerate() {
        let scale = params[i];
        let shift = match mode {
            AlignmentMode::Affine => params[batch_size + i],
            _ => 0.0,
        };
        sample.mapv_inplace(|d| d * scale + shift);
    }
    aligned
}
