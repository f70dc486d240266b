//! Error types for wavelet denoising

use thiserror::Error;
use vw_core::TransformError;

/// Denoising error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenoiseError {
    /// Underlying transform failure (validation, levels, lengths)
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Noise estimator window must hold at least one sample
    #[error("noise window size must be nonzero")]
    EmptyNoiseWindow,
}

/// Result type for denoising operations
pub type DenoiseResult<T> = Result<T, DenoiseError>;
