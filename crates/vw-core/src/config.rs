//! Frozen configuration enums shared across the transform crates

use serde::{Deserialize, Serialize};

/// Boundary handling for circular convolution
///
/// Only these two modes participate in the MODWT; anything else is rejected
/// at transform construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Indices wrap around the signal ends
    Periodic,
    /// Indices beyond the signal read as zero
    ZeroPadding,
}

impl Default for BoundaryMode {
    fn default() -> Self {
        Self::Periodic
    }
}

/// Policy when a streaming subscriber's pending queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackpressureMode {
    /// `push` refuses to process further blocks until demand arrives
    Block,
    /// The result is dropped for that subscriber and an error is delivered
    Drop,
}

impl Default for BackpressureMode {
    fn default() -> Self {
        Self::Block
    }
}

/// What to do with a partially filled block when a stream closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlushPolicy {
    /// Discard the residual samples
    DropResidual,
    /// Zero-pad the residual up to a full block and emit it
    ZeroPadResidual,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self::DropResidual
    }
}
