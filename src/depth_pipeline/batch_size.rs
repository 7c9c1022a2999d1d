//! Inference batch size selection
//!
//! Ensemble members are predicted in batches; the size is looked up from
//! settings measured on reference GPUs.

use serde::Deserialize;

/// Floating-point precision the denoiser runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDtype {
    Float32,
    Float16,
}

struct BatchSetting {
    res: usize,
    total_vram_gb: f64,
    batch_size: usize,
    dtype: InferenceDtype,
}

const fn setting(res: usize, total_vram_gb: f64, batch_size: usize, dtype: InferenceDtype) -> BatchSetting {
    BatchSetting { res, total_vram_gb, batch_size, dtype }
}

use InferenceDtype::{Float16, Float32};

const SEARCH_TABLE: &[BatchSetting] = &[
    // A100-PCIE-80GB
    setting(768, 79.0, 35, Float32),
    setting(1024, 79.0, 20, Float32),
    // A100-PCIE-40GB
    setting(768, 39.0, 15, Float32),
    setting(1024, 39.0, 8, Float32),
    setting(768, 39.0, 30, Float16),
    setting(1024, 39.0, 15, Float16),
    // RTX3090, RTX4090
    setting(512, 23.0, 20, Float32),
    setting(768, 23.0, 7, Float32),
    setting(1024, 23.0, 3, Float32),
    setting(512, 23.0, 40, Float16),
    setting(768, 23.0, 18, Float16),
    setting(1024, 23.0, 10, Float16),
    // GTX1080Ti
    setting(512, 10.0, 5, Float32),
    setting(768, 10.0, 2, Float32),
    setting(512, 10.0, 10, Float16),
    setting(768, 10.0, 5, Float16),
    setting(1024, 10.0, 3, Float16),
];

/// Picks an inference batch size for `ensemble_size` predictions at
/// `input_res` (longest side, pixels).
///
/// `total_vram_gb` is `None` when no accelerator is present, which always
/// yields 1. The first matching setting, ordered by resolution and then by
/// decreasing VRAM, wins; its size is capped at `ensemble_size` and pulled
/// down to `ceil(ensemble_size / 2)` when it lies strictly between the two,
/// so the batches split evenly.
pub fn find_batch_size(
    ensemble_size: usize,
    input_res: usize,
    dtype: InferenceDtype,
    total_vram_gb: Option<f64>,
) -> usize {
    let Some(total_vram_gb) = total_vram_gb else {
        return 1;
    };

    let mut candidates: Vec<&BatchSetting> =
        SEARCH_TABLE.iter().filter(|s| s.dtype == dtype).collect();
    candidates.sort_by(|a, b| {
        a.res
            .cmp(&b.res)
            .then(b.total_vram_gb.total_cmp(&a.total_vram_gb))
    });

    let half = ensemble_size.div_ceil(2);
    candidates
        .into_iter()
        .find(|s| input_res <= s.res && total_vram_gb >= s.total_vram_gb)
        .map(|s| {
            if s.batch_size > ensemble_size {
                ensemble_size
            } else if s.batch_size > half && s.batch_size < ensemble_size {
                half
            } else {
                s.batch_size
            }
        })
        .unwrap_or(1)
}
