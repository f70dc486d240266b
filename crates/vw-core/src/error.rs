//! Error types for the transform crates

use thiserror::Error;

/// Transform error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Input signal is empty
    #[error("input signal is empty")]
    EmptySignal,

    /// Signal shorter than the wavelet filter
    #[error("signal length {n} is shorter than filter length {filter_len}")]
    SignalTooShort { n: usize, filter_len: usize },

    /// Coefficient lengths disagree
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Decomposition depth beyond the safe maximum
    #[error("level {requested} exceeds maximum {max} for this signal")]
    LevelOutOfRange { requested: usize, max: usize },

    /// Wavelet kind not usable with the MODWT
    #[error("wavelet '{name}' does not support the MODWT")]
    UnsupportedWavelet { name: String },

    /// Catalog lookup failed
    #[error("unknown wavelet '{name}'")]
    UnknownWavelet { name: String },

    /// One signal in a batch has a different length
    #[error("batch signal {index}: expected length {expected}, got {got}")]
    MismatchedBatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// Operation on a closed stream
    #[error("stream is closed")]
    StreamClosed,

    /// Subscriber queue full in the streaming processor
    #[error("subscriber {subscriber} queue is full")]
    BackpressureOverflow { subscriber: usize },

    /// Subscriber callback panicked; it has been unsubscribed
    #[error("subscriber {subscriber} raised during delivery")]
    SubscriberFault { subscriber: usize },

    /// Streaming block size below the filter length
    #[error("block size {block_size} is smaller than filter length {filter_len}")]
    BlockTooSmall {
        block_size: usize,
        filter_len: usize,
    },
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
