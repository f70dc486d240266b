//! vw-core: Shared types, errors, and utilities for VectorWave
//!
//! This crate provides the foundational types used across all VectorWave
//! crates: the sample alias, boundary and backpressure configuration,
//! the transform error taxonomy, and the recyclable buffer pool.

mod config;
mod error;
mod pool;
mod sample;

pub use config::*;
pub use error::*;
pub use pool::*;
pub use sample::*;
