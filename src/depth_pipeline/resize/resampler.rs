use ndarray::{Array4, ArrayView4};
use tracing::debug;

use crate::depth_pipeline::resize::types::ResampleMethod;

pub trait Resampler {
    /// Resizes every sample of a (B, C, H, W) batch to `height` x `width`.
    fn resize(
        &self,
        batch: ArrayView4<'_, f64>,
        height: usize,
        width: usize,
        method: ResampleMethod,
    ) -> Array4<f64>;
}

/// Aspect-preserving size whose longer side equals `max_edge`.
pub fn max_res_dims(height: usize, width: usize, max_edge: usize) -> (usize, usize) {
    let factor = (max_edge as f64 / height as f64).min(max_edge as f64 / width as f64);
    let new_height = ((height as f64 * factor) as usize).max(1);
    let new_width = ((width as f64 * factor) as usize).max(1);
    (new_height, new_width)
}

/// Downsamples `batch` so that its longer spatial side is at most `max_res`.
///
/// Batches already within the limit are returned unchanged; this never
/// upsamples.
pub fn resize_max_res<R: Resampler + ?Sized>(
    resampler: &R,
    batch: ArrayView4<'_, f64>,
    max_res: usize,
    method: ResampleMethod,
) -> Array4<f64> {
    let (_, _, height, width) = batch.dim();
    let longest = height.max(width);
    if longest <= max_res {
        return batch.to_owned();
    }

    let (new_height, new_width) = max_res_dims(height, width, max_res);
    debug!(
        from_height = height,
        from_width = width,
        to_height = new_height,
        to_width = new_width,
        %method,
        "Downsampling batch"
    );
    resampler.resize(batch, new_height, new_width, method)
}
