use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("Invalid depth batch shape: {0}")]
    InvalidShape(String),

    #[error("Unknown reduction '{0}', expected 'mean' or 'median'")]
    InvalidReduction(String),

    #[error(
        "Unsupported alignment: scale_invariant={scale_invariant}, shift_invariant={shift_invariant} \
         (shift-only alignment is not supported)"
    )]
    UnsupportedAlignment {
        scale_invariant: bool,
        shift_invariant: bool,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration {path}: {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF depth map: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF depth map: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Depth map {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EnsembleError>;
