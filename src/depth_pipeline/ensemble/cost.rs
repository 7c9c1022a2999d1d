use argmin::core::{CostFunction, Error};
use ndarray::{ArrayView4, Axis};

use crate::depth_pipeline::ensemble::params::align;
use crate::depth_pipeline::ensemble::reduce::{reduce, value_range};
use crate::depth_pipeline::ensemble::types::{AlignmentMode, Reduction};

/// Pairwise-consistency cost of a candidate alignment.
///
/// Sums the RMS difference of every unordered pair of aligned samples and,
/// when `regularizer_strength > 0`, adds the distance of the reduced
/// prediction's range from [0, 1].
pub struct AlignmentCost<'a> {
    batch: ArrayView4<'a, f64>,
    mode: AlignmentMode,
    reduction: Reduction,
    regularizer_strength: f64,
}

impl<'a> AlignmentCost<'a> {
    pub fn new(
        batch: ArrayView4<'a, f64>,
        mode: AlignmentMode,
        reduction: Reduction,
        regularizer_strength: f64,
    ) -> Self {
        Self {
            batch,
            mode,
            reduction,
            regularizer_strength,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch.len_of(Axis(0))
    }

    /// Number of parameters the cost expects.
    pub fn dim(&self) -> usize {
        self.mode.param_len(self.batch_size())
    }

    pub fn evaluate(&self, params: &[f64]) -> f64 {
        let aligned = align(self.batch, params, self.mode);
        let samples: Vec<_> = aligned.outer_iter().collect();

        let mut cost = 0.0;
        for (i, a) in samples.iter().enumerate() {
            for b in &samples[i + 1..] {
                let sq_sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                cost += (sq_sum / a.len() as f64).sqrt();
            }
        }

        if self.regularizer_strength > 0.0 {
            let (prediction, _) = reduce(aligned.view(), self.reduction, false);
            let (min, max) = value_range(prediction.view());
            let err_near = (0.0 - min).abs();
            let err_far = (1.0 - max).abs();
            cost += (err_near + err_far) * self.regularizer_strength;
        }

        cost
    }
}

impl CostFunction for AlignmentCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(params))
    }
}
