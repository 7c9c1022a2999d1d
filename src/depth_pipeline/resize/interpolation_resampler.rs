use ndarray::{Array4, ArrayView4};

use crate::depth_pipeline::resize::resampler::Resampler;
use crate::depth_pipeline::resize::types::ResampleMethod;

/// CPU resampler supporting every `ResampleMethod`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolationResampler;

fn nearest_indices(input: usize, output: usize, centred: bool) -> Vec<usize> {
    let ratio = input as f64 / output as f64;
    let offset = if centred { 0.5 } else { 0.0 };
    (0..output)
        .map(|dst| (((dst as f64 + offset) * ratio).floor() as usize).min(input - 1))
        .collect()
}

/// Lower source index, upper source index and weight of the upper one.
fn linear_taps(input: usize, output: usize) -> Vec<(usize, usize, f64)> {
    let ratio = input as f64 / output as f64;
    (0..output)
        .map(|dst| {
            let src = ((dst as f64 + 0.5) * ratio - 0.5).max(0.0);
            let lo = (src.floor() as usize).min(input - 1);
            let hi = (lo + 1).min(input - 1);
            (lo, hi, src - lo as f64)
        })
        .collect()
}

impl Resampler for InterpolationResampler {
    fn resize(
        &self,
        batch: ArrayView4<'_, f64>,
        height: usize,
        width: usize,
        method: ResampleMethod,
    ) -> Array4<f64> {
        let (n, c, in_h, in_w) = batch.dim();
        if (in_h, in_w) == (height, width) {
            return batch.to_owned();
        }

        match method {
            ResampleMethod::Nearest | ResampleMethod::NearestExact => {
                let centred = method == ResampleMethod::NearestExact;
                let ys = nearest_indices(in_h, height, centred);
                let xs = nearest_indices(in_w, width, centred);
                Array4::from_shape_fn((n, c, height, width), |(b, ch, y, x)| {
                    batch[[b, ch, ys[y], xs[x]]]
                })
            }
            ResampleMethod::Bilinear => {
                let ys = linear_taps(in_h, height);
                let xs = linear_taps(in_w, width);
                Array4::from_shape_fn((n, c, height, width), |(b, ch, y, x)| {
                    let (y0, y1, wy) = ys[y];
                    let (x0, x1, wx) = xs[x];
                    let top = batch[[b, ch, y0, x0]] * (1.0 - wx) + batch[[b, ch, y0, x1]] * wx;
                    let bottom = batch[[b, ch, y1, x0]] * (1.0 - wx) + batch[[b, ch, y1, x1]] * wx;
                    top * (1.0 - wy) + bottom * wy
                })
            }
        }
    }
}
