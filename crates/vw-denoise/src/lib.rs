//! vw-denoise: Wavelet-shrinkage denoising for VectorWave
//!
//! Threshold-based noise removal layered on the multi-level MODWT:
//!
//! ## Threshold selection
//! - Universal: `sigma * sqrt(2 ln N)`
//! - SURE: closed-form minimizer of Stein's unbiased risk estimate
//! - Minimax: published factor table, interpolated in log2 N
//!
//! ## Shrinkage
//! - Soft (shrink toward zero) and hard (kill below threshold)
//!
//! ## Noise estimation
//! - Batch: MAD of the finest detail coefficients
//! - Streaming: ring-windowed MAD or adaptive exponential smoothing

mod error;

pub mod estimate;
pub mod shrink;
pub mod streaming;
pub mod threshold;

pub use error::{DenoiseError, DenoiseResult};
pub use estimate::{NoiseEstimation, NoiseEstimator, mad_sigma};
pub use shrink::{DenoiseConfig, WaveletDenoiser, denoise};
pub use streaming::{StreamingDenoiser, StreamingDenoiserConfig};
pub use threshold::{
    ThresholdMethod, ThresholdType, apply_threshold, minimax_threshold, select_threshold,
    sure_threshold, universal_threshold,
};
