//! Stress tests for concurrent logging and stream decoding
//!
//! These tests verify:
//! - Frames from concurrent loggers never interleave on a shared sink
//! - Per-thread emission order survives the round trip
//! - Entry ids stay unique under contention
//! - A slow consumer applies backpressure without losing entries
//! - An endless source can be cancelled and closed promptly

use rust_typed_logger::fake::SharedBuffer;
use rust_typed_logger::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Worker(usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tick {
    seq: usize,
    note: String,
}

fn spec() -> Specification {
    Specification::new().context::<Worker>().event::<Tick>()
}

fn framed_logger(buffer: &SharedBuffer) -> Logger {
    Logger::builder()
        .specification(spec())
        .sink(buffer.clone())
        .encoder(FrameEncoder)
        .build()
        .expect("Failed to build logger")
}

/// Test that concurrent writers produce a cleanly decodable stream
#[test]
fn test_concurrent_writers_keep_frames_intact() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let buffer = SharedBuffer::new();
    let logger = framed_logger(&buffer);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.with_context(Worker(t));
            thread::spawn(move || {
                for seq in 0..PER_THREAD {
                    logger.info(Tick {
                        seq,
                        note: "x".repeat(seq % 97),
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Writer thread panicked");
    }

    assert_eq!(logger.metrics().entries_written(), (THREADS * PER_THREAD) as u64);

    let decoder = StreamDecoder::new(&spec(), Cursor::new(buffer.snapshot()))
        .expect("Failed to start decoder");
    let entries = BlockingReader::new(decoder)
        .entries()
        .expect("Stream should decode without errors");
    assert_eq!(entries.len(), THREADS * PER_THREAD);

    let mut next_seq: HashMap<usize, usize> = HashMap::new();
    let mut ids = HashSet::new();
    for entry in &entries {
        let worker = entry.contexts[0]
            .downcast_ref::<Worker>()
            .expect("Worker context")
            .0;
        let tick = entry.event.downcast_ref::<Tick>().expect("Tick event");
        let expected = next_seq.entry(worker).or_insert(0);
        assert_eq!(tick.seq, *expected, "thread {} out of order", worker);
        *expected += 1;
        assert!(ids.insert(entry.id.clone()), "duplicate id {}", entry.id);
    }
}

/// Test that a rendezvous channel with a slow consumer still delivers everything
#[test]
fn test_slow_consumer_backpressure() {
    const COUNT: usize = 200;

    let buffer = SharedBuffer::new();
    let logger = framed_logger(&buffer);
    for seq in 0..COUNT {
        logger.debug(Tick {
            seq,
            note: String::new(),
        });
    }

    let decoder = StreamDecoder::builder()
        .specification(spec())
        .buffer_size(0)
        .build(Cursor::new(buffer.snapshot()))
        .expect("Failed to start decoder");

    let mut seen = 0;
    while let Some(result) = decoder.recv() {
        let entry = result.expect("Entry should decode");
        assert_eq!(entry.event.downcast_ref::<Tick>().map(|t| t.seq), Some(seen));
        // Worker can be at most one entry ahead of delivery
        assert!(decoder.metrics().entries_delivered() <= seen as u64 + 2);
        seen += 1;
        if seen % 50 == 0 {
            thread::sleep(Duration::from_millis(5));
        }
    }
    assert_eq!(seen, COUNT);
    assert_eq!(decoder.state(), DecoderState::Exhausted);
}

/// Source that repeats one frame forever
struct Endless {
    frame: Vec<u8>,
    pos: usize,
}

impl Read for Endless {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            buf[n] = self.frame[self.pos];
            self.pos = (self.pos + 1) % self.frame.len();
            n += 1;
        }
        Ok(n)
    }
}

/// Test that cancelling an endless stream stops the worker within the timeout
#[test]
fn test_cancel_endless_stream() {
    let buffer = SharedBuffer::new();
    framed_logger(&buffer).warn(Tick {
        seq: 1,
        note: "again".into(),
    });

    let mut decoder = StreamDecoder::builder()
        .specification(spec())
        .buffer_size(4)
        .build(Endless {
            frame: buffer.snapshot(),
            pos: 0,
        })
        .expect("Failed to start decoder");

    for _ in 0..1_000 {
        let entry = decoder
            .recv()
            .expect("Endless stream never closes")
            .expect("Entry should decode");
        assert_eq!(entry.level, Level::Warn);
    }

    let handle = decoder.cancel_handle();
    let canceller = thread::spawn(move || handle.cancel());
    canceller.join().expect("Cancel thread panicked");

    assert!(decoder.recv().is_none());
    let start = Instant::now();
    assert!(decoder.close(), "worker should stop once cancelled");
    assert!(start.elapsed() < DEFAULT_SHUTDOWN_TIMEOUT);
    assert_eq!(decoder.state(), DecoderState::Closed);
}

/// Test that many decoders can read the same bytes in parallel
#[test]
fn test_parallel_decoders() {
    let buffer = SharedBuffer::new();
    let logger = framed_logger(&buffer);
    for seq in 0..300 {
        logger.error(Tick {
            seq,
            note: "parallel".into(),
        });
    }
    let bytes = Arc::new(buffer.snapshot());

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                let decoder = StreamDecoder::new(&spec(), Cursor::new(bytes.as_ref().clone()))
                    .expect("Failed to start decoder");
                BlockingReader::new(decoder)
                    .entries()
                    .expect("Stream should decode")
                    .len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("Reader thread panicked"), 300);
    }
}
