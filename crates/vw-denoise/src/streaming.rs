//! Streaming wavelet denoiser
//!
//! Runs the batch shrinkage pipeline on fixed-size blocks while tracking the
//! noise level online from the most recent finest-detail samples. Blocks are
//! independent; the only state carried across them is the noise estimator's
//! ring window.

use vw_core::{Sample, TransformError};
use vw_dsp::multilevel::{MultiLevelModwt, max_level};
use vw_dsp::wavelet::Wavelet;

use crate::error::{DenoiseError, DenoiseResult};
use crate::estimate::{NoiseEstimation, NoiseEstimator};
use crate::threshold::{ThresholdMethod, ThresholdType, apply_threshold, select_threshold};

/// Frozen streaming denoiser configuration
#[derive(Debug, Clone)]
pub struct StreamingDenoiserConfig {
    /// Samples per processed block
    pub block_size: usize,
    /// Decomposition depth per block
    pub levels: usize,
    /// Threshold selection rule
    pub method: ThresholdMethod,
    /// Shrinkage nonlinearity
    pub threshold_type: ThresholdType,
    /// Boundary handling within each block
    pub boundary: vw_core::BoundaryMode,
    /// Online noise estimation method
    pub noise_estimation: NoiseEstimation,
    /// Ring-buffer length for the noise estimate
    pub noise_window: usize,
}

impl Default for StreamingDenoiserConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            levels: 4,
            method: ThresholdMethod::default(),
            threshold_type: ThresholdType::default(),
            boundary: vw_core::BoundaryMode::default(),
            noise_estimation: NoiseEstimation::default(),
            noise_window: 1024,
        }
    }
}

/// Block-based denoiser with online noise tracking
pub struct StreamingDenoiser {
    transform: MultiLevelModwt,
    config: StreamingDenoiserConfig,
    estimator: NoiseEstimator,
    processed_samples: u64,
}

impl StreamingDenoiser {
    pub fn new(wavelet: Wavelet, config: StreamingDenoiserConfig) -> DenoiseResult<Self> {
        if config.noise_window == 0 {
            return Err(DenoiseError::EmptyNoiseWindow);
        }
        let transform = MultiLevelModwt::new(wavelet, config.boundary)?;

        let filter_len = transform.wavelet().filter_len();
        if config.block_size < filter_len {
            return Err(TransformError::BlockTooSmall {
                block_size: config.block_size,
                filter_len,
            }
            .into());
        }
        let max = max_level(config.block_size, filter_len);
        if config.levels == 0 || config.levels > max {
            return Err(TransformError::LevelOutOfRange {
                requested: config.levels,
                max,
            }
            .into());
        }

        let estimator = NoiseEstimator::new(config.noise_estimation, config.noise_window);
        Ok(Self {
            transform,
            config,
            estimator,
            processed_samples: 0,
        })
    }

    pub fn config(&self) -> &StreamingDenoiserConfig {
        &self.config
    }

    /// Denoise one block of exactly `block_size` samples
    pub fn process_block(&mut self, block: &[Sample]) -> DenoiseResult<Vec<Sample>> {
        if block.len() != self.config.block_size {
            return Err(TransformError::LengthMismatch {
                expected: self.config.block_size,
                got: block.len(),
            }
            .into());
        }

        let decomposition = self.transform.forward(block, self.config.levels)?;
        let sigma = self.estimator.update(decomposition.detail(1));
        self.processed_samples += block.len() as u64;

        if sigma == 0.0 {
            log::warn!("streaming noise estimate is zero; block passes through");
            return Ok(self.transform.inverse(&decomposition)?);
        }

        let n = block.len();
        let mut coeffs = decomposition.into_mutable();
        for level in 1..=self.config.levels {
            let tau = select_threshold(self.config.method, sigma, n, coeffs.detail(level));
            apply_threshold(coeffs.detail_mut(level), tau, self.config.threshold_type);
        }

        Ok(self.transform.inverse(&coeffs.freeze())?)
    }

    /// Most recent noise estimate
    pub fn current_noise_level(&self) -> f64 {
        self.estimator.sigma()
    }

    /// Total samples processed so far
    pub fn samples_processed(&self) -> u64 {
        self.processed_samples
    }

    /// Drop the noise history and counters
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.processed_samples = 0;
    }
}
