//! Resampling types

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::depth_pipeline::common::error::EnsembleError;

/// Interpolation used when resizing a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleMethod {
    /// Source index `floor(dst * in / out)`
    Nearest,
    /// Source index `floor((dst + 0.5) * in / out)`, sampling pixel centres
    NearestExact,
    /// Bilinear with half-pixel centres and clamped edges
    Bilinear,
}

impl FromStr for ResampleMethod {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "nearest-exact" | "nearest_exact" => Ok(Self::NearestExact),
            "bilinear" => Ok(Self::Bilinear),
            other => Err(EnsembleError::InvalidConfig(format!(
                "unknown resample method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("nearest"),
            Self::NearestExact => f.write_str("nearest-exact"),
            Self::Bilinear => f.write_str("bilinear"),
        }
    }
}
