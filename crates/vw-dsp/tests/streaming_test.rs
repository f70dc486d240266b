//! Streaming Processor Integration Tests
//!
//! Verifies that block-based streaming matches the batch transform on
//! aligned input, that delivery order is strict per subscriber, and that
//! both backpressure policies bound subscriber state.

use std::f64::consts::PI;
use std::sync::Arc;

use parking_lot::Mutex;
use vw_dsp::streaming::{ResultSink, StreamingConfig, StreamingModwt};
use vw_dsp::{
    BackpressureMode, BoundaryMode, FlushPolicy, Modwt, ModwtResult, Sample, TransformError,
    get_wavelet,
};

struct RecordingSink {
    results: Arc<Mutex<Vec<ModwtResult>>>,
    errors: Arc<Mutex<Vec<TransformError>>>,
    completed: Arc<Mutex<bool>>,
}

impl ResultSink for RecordingSink {
    fn on_result(&mut self, result: &ModwtResult) {
        self.results.lock().push(result.clone());
    }
    fn on_error(&mut self, error: &TransformError) {
        self.errors.lock().push(error.clone());
    }
    fn on_complete(&mut self) {
        *self.completed.lock() = true;
    }
}

#[allow(clippy::type_complexity)]
fn recording_sink() -> (
    Box<RecordingSink>,
    Arc<Mutex<Vec<ModwtResult>>>,
    Arc<Mutex<Vec<TransformError>>>,
    Arc<Mutex<bool>>,
) {
    let results = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(Mutex::new(false));
    let sink = Box::new(RecordingSink {
        results: Arc::clone(&results),
        errors: Arc::clone(&errors),
        completed: Arc::clone(&completed),
    });
    (sink, results, errors, completed)
}

fn tone(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| (2.0 * PI * i as f64 / 53.0).sin() + 0.2 * (2.0 * PI * i as f64 / 11.0).cos())
        .collect()
}

#[test]
fn streaming_equals_batch_on_aligned_input() {
    // Five 480-sample blocks fed in uneven chunks.
    let block = 480;
    let signal = tone(5 * block);
    let chunks = [100, 380, 480, 480, 480, 480];
    assert_eq!(chunks.iter().sum::<usize>(), signal.len());

    let mut p = StreamingModwt::new(
        get_wavelet("haar").unwrap(),
        BoundaryMode::Periodic,
        StreamingConfig::with_block_size(block),
    )
    .unwrap();
    let (sink, results, errors, _) = recording_sink();
    p.subscribe(sink, u64::MAX);

    let mut offset = 0;
    for len in chunks {
        p.push(&signal[offset..offset + len]).unwrap();
        offset += len;
    }

    let results = results.lock();
    assert_eq!(results.len(), 5);
    assert!(errors.lock().is_empty());

    let transform = Modwt::new(get_wavelet("haar").unwrap(), BoundaryMode::Periodic).unwrap();
    for (i, result) in results.iter().enumerate() {
        let expected = transform.forward(&signal[i * block..(i + 1) * block]).unwrap();
        let err = result
            .approx()
            .iter()
            .zip(expected.approx())
            .chain(result.detail().iter().zip(expected.detail()))
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        assert!(err <= 1e-12, "block {i}: error {err}");
    }
}

#[test]
fn chunking_does_not_change_results() {
    let block = 128;
    let signal = tone(4 * block);

    let run = |chunk_lens: &[usize]| -> Vec<ModwtResult> {
        let mut p = StreamingModwt::new(
            get_wavelet("db4").unwrap(),
            BoundaryMode::Periodic,
            StreamingConfig::with_block_size(block),
        )
        .unwrap();
        let (sink, results, _, _) = recording_sink();
        p.subscribe(sink, u64::MAX);
        let mut offset = 0;
        for &len in chunk_lens {
            p.push(&signal[offset..offset + len]).unwrap();
            offset += len;
        }
        assert_eq!(offset, signal.len());
        let out = results.lock().clone();
        out
    };

    let one_shot = run(&[512]);
    let sample_at_a_time = run(&[1; 512]);
    let uneven = run(&[7, 100, 21, 300, 84]);

    assert_eq!(one_shot.len(), 4);
    assert_eq!(one_shot, sample_at_a_time);
    assert_eq!(one_shot, uneven);
}

#[test]
fn per_subscriber_ordering_and_independent_demand() {
    let block = 64;
    let mut p = StreamingModwt::new(
        get_wavelet("haar").unwrap(),
        BoundaryMode::Periodic,
        StreamingConfig {
            block_size: block,
            backpressure: BackpressureMode::Block,
            flush: FlushPolicy::DropResidual,
            queue_capacity: 8,
        },
    )
    .unwrap();

    let (eager_sink, eager_results, _, _) = recording_sink();
    let (lazy_sink, lazy_results, _, _) = recording_sink();
    p.subscribe(eager_sink, u64::MAX);
    let lazy_id = p.subscribe(lazy_sink, 1);

    // Blocks with distinct constant levels let us read the order back.
    let mut signal = Vec::new();
    for level in 0..4 {
        signal.extend(std::iter::repeat_n(level as f64, block));
    }
    p.push(&signal).unwrap();

    assert_eq!(eager_results.lock().len(), 4);
    assert_eq!(lazy_results.lock().len(), 1);
    assert_eq!(p.pending_results(lazy_id), Some(3));

    p.request(lazy_id, 10);
    let lazy = lazy_results.lock();
    assert_eq!(lazy.len(), 4);
    for (i, r) in lazy.iter().enumerate() {
        // Constant block value i: the Haar running average equals i.
        assert!((r.approx()[10] - i as f64).abs() <= 1e-12);
    }
}

#[test]
fn block_mode_bounds_queue_and_preserves_samples() {
    let block = 64;
    let queue_capacity = 3;
    let mut p = StreamingModwt::new(
        get_wavelet("haar").unwrap(),
        BoundaryMode::Periodic,
        StreamingConfig {
            block_size: block,
            backpressure: BackpressureMode::Block,
            flush: FlushPolicy::DropResidual,
            queue_capacity,
        },
    )
    .unwrap();
    let (sink, results, errors, _) = recording_sink();
    let id = p.subscribe(sink, 0);

    let signal = tone(10 * block);
    let mut pushed_blocks = 0;
    let mut refused = false;
    for chunk in signal.chunks(block) {
        match p.push(chunk) {
            Ok(_) => pushed_blocks += 1,
            Err(TransformError::BackpressureOverflow { .. }) => {
                refused = true;
                break;
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }

    assert!(refused, "push never saw backpressure");
    assert_eq!(pushed_blocks, queue_capacity);
    assert_eq!(p.pending_results(id), Some(queue_capacity));
    assert!(errors.lock().is_empty());
    // No data was lost: once demand arrives everything drains.
    p.request(id, u64::MAX);
    p.push(&[]).unwrap();
    assert_eq!(results.lock().len() + p.pending_results(id).unwrap(), 4);
}

#[test]
fn drop_mode_keeps_stream_alive() {
    let block = 64;
    let mut p = StreamingModwt::new(
        get_wavelet("haar").unwrap(),
        BoundaryMode::Periodic,
        StreamingConfig {
            block_size: block,
            backpressure: BackpressureMode::Drop,
            flush: FlushPolicy::DropResidual,
            queue_capacity: 2,
        },
    )
    .unwrap();
    let (sink, results, errors, completed) = recording_sink();
    let id = p.subscribe(sink, 0);

    p.push(&tone(6 * block)).unwrap();
    // Queue holds 2; the other 4 were dropped with an error each.
    assert_eq!(p.pending_results(id), Some(2));
    assert_eq!(errors.lock().len(), 4);
    assert!(
        errors
            .lock()
            .iter()
            .all(|e| matches!(e, TransformError::BackpressureOverflow { .. }))
    );

    p.request(id, 2);
    assert_eq!(results.lock().len(), 2);
    p.close().unwrap();
    assert!(*completed.lock());
}

#[test]
fn close_is_idempotent_and_final() {
    let mut p = StreamingModwt::new(
        get_wavelet("haar").unwrap(),
        BoundaryMode::Periodic,
        StreamingConfig::with_block_size(64),
    )
    .unwrap();
    let (sink, _, _, completed) = recording_sink();
    p.subscribe(sink, u64::MAX);

    p.push(&tone(64)).unwrap();
    p.close().unwrap();
    p.close().unwrap();
    assert!(*completed.lock());
    assert!(matches!(p.push(&[1.0]), Err(TransformError::StreamClosed)));
}
