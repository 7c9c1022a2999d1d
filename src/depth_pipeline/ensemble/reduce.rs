use ndarray::{Array4, ArrayView4};

use crate::depth_pipeline::ensemble::types::{EPSILON, Reduction};

/// Reduces an aligned (B, 1, H, W) batch to one (1, 1, H, W) map.
///
/// With `with_uncertainty` the dispersion paired with the reduction is
/// returned as well: standard deviation for `Mean`, mean absolute deviation
/// from the median for `Median`.
pub fn reduce(
    aligned: ArrayView4<'_, f64>,
    reduction: Reduction,
    with_uncertainty: bool,
) -> (Array4<f64>, Option<Array4<f64>>) {
    let (batch_size, _, height, width) = aligned.dim();
    let mut prediction = Array4::<f64>::zeros((1, 1, height, width));
    let mut uncertainty = with_uncertainty.then(|| Array4::<f64>::zeros((1, 1, height, width)));
    let mut column = Vec::with_capacity(batch_size);

    for y in 0..height {
        for x in 0..width {
            column.clear();
            column.extend((0..batch_size).map(|i| aligned[[i, 0, y, x]]));

            let (center, spread) = match reduction {
                Reduction::Mean => mean_and_std(&column, with_uncertainty),
                Reduction::Median => median_and_mad(&mut column, with_uncertainty),
            };
            prediction[[0, 0, y, x]] = center;
            if let Some(u) = uncertainty.as_mut() {
                u[[0, 0, y, x]] = spread;
            }
        }
    }

    (prediction, uncertainty)
}

fn mean_and_std(values: &[f64], with_spread: bool) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if !with_spread || values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

// Even batch sizes take the lower of the two middle values.
fn median_and_mad(values: &mut [f64], with_spread: bool) -> (f64, f64) {
    values.sort_by(|a, b| a.total_cmp(b));
    let median = values[(values.len() - 1) / 2];
    if !with_spread {
        return (median, 0.0);
    }
    let mad = values.iter().map(|v| (v - median).abs()).sum::<f64>() / values.len() as f64;
    (median, mad)
}

/// Minimum and maximum over a whole map.
pub fn value_range(map: ArrayView4<'_, f64>) -> (f64, f64) {
    map.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Rescales `map` in place so that it spans [0, 1].
///
/// The divisor is floored at `EPSILON`, so a constant map becomes all zeros.
pub fn normalize_min_max(map: &mut Array4<f64>) {
    let (min, max) = value_range(map.view());
    let range = (max - min).max(EPSILON);
    map.mapv_inplace(|v| (v - min) / range);
}
