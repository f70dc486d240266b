//! Block-oriented streaming MODWT
//!
//! A single-threaded cooperative publisher: samples accumulate until a full
//! block is available, each completed block runs the single-level forward
//! transform, and the result is delivered synchronously to every subscriber
//! with positive demand. Results produced while a subscriber has no demand
//! sit in a bounded per-subscriber queue; a full queue either refuses the
//! `push` (Block mode) or drops the result and signals the subscriber
//! (Drop mode). Blocks are independent; no inter-block continuity is
//! attempted.
//!
//! All state mutation happens on the caller's thread. Sinks that need
//! parallelism copy the result and hand it off themselves.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use vw_core::{
    BackpressureMode, BoundaryMode, FlushPolicy, Sample, TransformError, TransformResult,
};

use crate::modwt::{Modwt, ModwtResult};
use crate::wavelet::Wavelet;

/// Default bound on each subscriber's pending-result queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Receiver of streaming results
///
/// Callbacks run synchronously on the pushing thread, in subscription
/// order. A callback that panics gets the subscriber unsubscribed; the
/// stream continues for the others.
pub trait ResultSink {
    fn on_result(&mut self, result: &ModwtResult);
    fn on_error(&mut self, error: &TransformError);
    fn on_complete(&mut self);
}

/// Frozen per-stream configuration
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Samples per emitted result; must be >= the wavelet's filter length
    pub block_size: usize,
    /// Policy when a subscriber queue is full
    pub backpressure: BackpressureMode,
    /// What happens to a partial block at close
    pub flush: FlushPolicy,
    /// Bound on each subscriber's pending queue
    pub queue_capacity: usize,
}

impl StreamingConfig {
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            backpressure: BackpressureMode::default(),
            flush: FlushPolicy::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

struct Subscriber {
    id: usize,
    sink: Box<dyn ResultSink>,
    demand: u64,
    queue: VecDeque<Arc<ModwtResult>>,
    active: bool,
}

impl Subscriber {
    /// Deliver a result, isolating panics; returns false when the sink
    /// faulted and was deactivated
    fn deliver_result(&mut self, result: &ModwtResult) -> bool {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.sink.on_result(result)));
        if outcome.is_err() {
            self.fault();
            return false;
        }
        true
    }

    fn deliver_error(&mut self, error: &TransformError) {
        if catch_unwind(AssertUnwindSafe(|| self.sink.on_error(error))).is_err() {
            self.fault();
        }
    }

    fn deliver_complete(&mut self) {
        if catch_unwind(AssertUnwindSafe(|| self.sink.on_complete())).is_err() {
            self.active = false;
        }
    }

    fn fault(&mut self) {
        log::warn!("subscriber {} raised during delivery; unsubscribing", self.id);
        self.active = false;
        let fault = TransformError::SubscriberFault {
            subscriber: self.id,
        };
        // Best-effort notification; a second panic just stays unsubscribed.
        let _ = catch_unwind(AssertUnwindSafe(|| self.sink.on_error(&fault)));
    }
}

/// Streaming MODWT processor for one stream
pub struct StreamingModwt {
    transform: Modwt,
    config: StreamingConfig,
    buffer: Vec<Sample>,
    subscribers: Vec<Subscriber>,
    next_id: usize,
    processed_samples: u64,
    emitted_blocks: u64,
    closed: bool,
}

impl StreamingModwt {
    pub fn new(
        wavelet: Wavelet,
        boundary: BoundaryMode,
        config: StreamingConfig,
    ) -> TransformResult<Self> {
        let transform = Modwt::new(wavelet, boundary)?;
        let filter_len = transform.wavelet().filter_len();
        if config.block_size < filter_len {
            return Err(TransformError::BlockTooSmall {
                block_size: config.block_size,
                filter_len,
            });
        }
        let config = StreamingConfig {
            queue_capacity: config.queue_capacity.max(1),
            ..config
        };
        Ok(Self {
            transform,
            config,
            buffer: Vec::new(),
            subscribers: Vec::new(),
            next_id: 0,
            processed_samples: 0,
            emitted_blocks: 0,
            closed: false,
        })
    }

    /// Register a sink; returns its subscriber id
    pub fn subscribe(&mut self, sink: Box<dyn ResultSink>, initial_demand: u64) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            sink,
            demand: initial_demand,
            queue: VecDeque::new(),
            active: true,
        });
        id
    }

    /// Grant a subscriber up to `n` additional results
    ///
    /// Queued results drain immediately; any blocks held back by
    /// backpressure are then processed.
    pub fn request(&mut self, id: usize, n: u64) {
        if self.closed {
            return;
        }
        let Some(sub) = self.subscribers.iter_mut().find(|s| s.active && s.id == id) else {
            log::warn!("request for unknown subscriber {id}");
            return;
        };
        sub.demand = sub.demand.saturating_add(n);
        while sub.active && sub.demand > 0 {
            let Some(result) = sub.queue.pop_front() else {
                break;
            };
            sub.demand -= 1;
            sub.deliver_result(&result);
        }
        // Freed queue space may unblock buffered blocks.
        let _ = self.pump(false);
        self.subscribers.retain(|s| s.active);
    }

    /// Remove a subscriber; effective before the next block is delivered
    pub fn unsubscribe(&mut self, id: usize) {
        self.subscribers.retain(|s| s.id != id);
    }

    /// Append samples, emitting one result per completed block
    ///
    /// Returns the number of results emitted by this call. In Block mode a
    /// full subscriber queue makes this return `BackpressureOverflow`
    /// without consuming the pending block; the samples stay buffered and
    /// are processed once demand arrives.
    pub fn push(&mut self, chunk: &[Sample]) -> TransformResult<usize> {
        if self.closed {
            return Err(TransformError::StreamClosed);
        }
        self.buffer.extend_from_slice(chunk);
        self.processed_samples += chunk.len() as u64;
        let emitted = self.pump(true)?;
        self.subscribers.retain(|s| s.active);
        Ok(emitted)
    }

    /// Flush the residual per policy and deliver `on_complete`
    pub fn close(&mut self) -> TransformResult<()> {
        if self.closed {
            return Ok(());
        }
        let _ = self.pump(false)?;

        if !self.buffer.is_empty() && self.config.flush == FlushPolicy::ZeroPadResidual {
            let residual = self.buffer.len() % self.config.block_size;
            if residual > 0 {
                self.buffer
                    .resize(self.buffer.len() + self.config.block_size - residual, 0.0);
            }
            let _ = self.pump(false)?;
        }
        if !self.buffer.is_empty() {
            log::debug!("dropping {} residual samples at close", self.buffer.len());
            self.buffer.clear();
        }

        for sub in &mut self.subscribers {
            if sub.active {
                sub.deliver_complete();
            }
        }
        self.subscribers.retain(|s| s.active);
        self.closed = true;
        Ok(())
    }

    /// Process buffered full blocks
    ///
    /// `strict` is the push path: in Block mode a full zero-demand queue
    /// surfaces as an error there, while the request/close paths simply stop.
    fn pump(&mut self, strict: bool) -> TransformResult<usize> {
        let block_size = self.config.block_size;
        let mut emitted = 0;

        while self.buffer.len() >= block_size {
            if self.config.backpressure == BackpressureMode::Block {
                let blocked = self
                    .subscribers
                    .iter()
                    .find(|s| s.active && s.demand == 0 && s.queue.len() >= self.config.queue_capacity);
                if let Some(sub) = blocked {
                    if strict {
                        return Err(TransformError::BackpressureOverflow { subscriber: sub.id });
                    }
                    return Ok(emitted);
                }
            }

            let block: Vec<Sample> = self.buffer.drain(..block_size).collect();
            let result = Arc::new(self.transform.forward(&block)?);
            self.emitted_blocks += 1;
            emitted += 1;
            self.deliver(&result);
        }
        Ok(emitted)
    }

    fn deliver(&mut self, result: &Arc<ModwtResult>) {
        let capacity = self.config.queue_capacity;
        for sub in &mut self.subscribers {
            if !sub.active {
                continue;
            }
            if sub.demand > 0 {
                sub.demand -= 1;
                sub.deliver_result(result);
            } else if sub.queue.len() < capacity {
                sub.queue.push_back(Arc::clone(result));
            } else {
                // Drop mode, or a forced flush at close: the subscriber
                // loses this result and is told so.
                log::warn!(
                    "subscriber {} queue full ({capacity}); dropping result",
                    sub.id
                );
                let overflow = TransformError::BackpressureOverflow { subscriber: sub.id };
                sub.deliver_error(&overflow);
            }
        }
    }

    /// Total samples accepted by `push`
    pub fn processed_samples(&self) -> u64 {
        self.processed_samples
    }

    /// Total results emitted
    pub fn emitted_blocks(&self) -> u64 {
        self.emitted_blocks
    }

    /// Samples currently buffered awaiting a full block
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|s| s.active).count()
    }

    /// Pending queued results for a subscriber
    pub fn pending_results(&self, id: usize) -> Option<usize> {
        self.subscribers
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.queue.len())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }
}
