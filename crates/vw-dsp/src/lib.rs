//! vw-dsp: The VectorWave MODWT engine
//!
//! Shift-invariant wavelet transforms for one-dimensional real signals.
//!
//! ## Core Modules
//! - `simd` - Runtime SIMD detection (AVX2/SSE4.2/NEON) and diagnostics
//! - `wavelet` - Filter bank catalog (Daubechies, Symlet, Coiflet, splines)
//! - `filters` - MODWT filter scaling, upsampling, per-level caching
//! - `convolution` - Scalar, vector, and specialized circular kernels
//!
//! ## Transforms
//! - `modwt` - Single-level forward/inverse
//! - `multilevel` - Multi-level decomposition and reconstruction
//! - `batch` - Structure-of-arrays batch processing
//! - `streaming` - Block publisher with demand-driven subscribers

pub mod batch;
pub mod convolution;
pub mod filters;
pub mod modwt;
pub mod multilevel;
pub mod simd;
pub mod streaming;
pub mod wavelet;

// Re-exports for convenience
pub use batch::{BATCH_MIN_LEN, BATCH_MIN_SIGNALS, SoaBlock};
pub use convolution::{KernelKind, VECTOR_MIN_LEN, selected_kernel};
pub use filters::{FilterCache, LevelFilterBank};
pub use modwt::{Modwt, ModwtResult};
pub use multilevel::{
    MultiLevelModwt, MultiLevelModwtResult, MutableMultiLevelModwtResult, max_level,
};
pub use simd::{PerformanceInfo, SimdLevel, detect_simd_level, simd_level};
pub use streaming::{
    DEFAULT_QUEUE_CAPACITY, ResultSink, StreamingConfig, StreamingModwt,
};
pub use wavelet::{
    Wavelet, WaveletKind, biorthogonal_wavelets, get_wavelet, orthogonal_wavelets,
};

// Shared configuration and error types live in vw-core.
pub use vw_core::{
    BackpressureMode, BoundaryMode, BufferPool, FlushPolicy, PoolStats, Sample, TransformError,
    TransformResult,
};
