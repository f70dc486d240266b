//! Recyclable buffer pool
//!
//! Size-keyed bounded LIFO stacks of `Vec<f64>` for the transform hot paths.
//! The pool is passed in by construction; every transform also works without
//! one. Recycled buffers come back with unspecified contents - callers
//! overwrite completely.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::Sample;

/// Default cap on buffers held per size bucket
pub const DEFAULT_MAX_PER_SIZE: usize = 16;

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub held_buffers: usize,
}

impl PoolStats {
    /// Fraction of acquisitions served from the pool
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Size-keyed recyclable buffer pool
///
/// Safe for concurrent acquire/release across threads; a single mutex guards
/// the bucket map, hit/miss counters are atomics.
pub struct BufferPool {
    buckets: Mutex<HashMap<usize, Vec<Vec<Sample>>>>,
    max_per_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BufferPool {
    /// Create a pool with the default per-size cap
    pub fn new() -> Self {
        Self::with_max_per_size(DEFAULT_MAX_PER_SIZE)
    }

    /// Create a pool with an explicit per-size cap
    pub fn with_max_per_size(max_per_size: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_per_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Pop a buffer of exactly `len` samples, allocating on miss
    ///
    /// Contents of a recycled buffer are unspecified.
    pub fn acquire(&self, len: usize) -> Vec<Sample> {
        let recycled = {
            let mut buckets = self.buckets.lock();
            buckets.get_mut(&len).and_then(|stack| stack.pop())
        };

        match recycled {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("pool miss: allocating {len}-sample buffer");
                vec![0.0; len]
            }
        }
    }

    /// Return a buffer; dropped silently when the size bucket is full
    pub fn release(&self, buf: Vec<Sample>) {
        let len = buf.len();
        if len == 0 {
            return;
        }
        let mut buckets = self.buckets.lock();
        let stack = buckets.entry(len).or_default();
        if stack.len() < self.max_per_size {
            stack.push(buf);
        }
    }

    /// Drop all held buffers
    pub fn clear(&self) {
        self.buckets.lock().clear();
    }

    /// Counter snapshot
    pub fn stats(&self) -> PoolStats {
        let held_buffers = self.buckets.lock().values().map(Vec::len).sum();
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            held_buffers,
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
