//! In-memory logger for tests
//!
//! [`FakeLogger`] wires a [`Logger`] to a shared buffer with deterministic
//! collaborators: ids count up from `"0"`, the clock starts at the Unix
//! epoch and only moves when told to, entries are framed, and Fatal/Panic
//! aborts are recorded instead of acted on.
//!
//! ```
//! use rust_typed_logger::fake::FakeLogger;
//! use rust_typed_logger::prelude::*;
//!
//! let fake = FakeLogger::new(Specification::new()).unwrap();
//! fake.info(UnstructuredEvent::new("hello"));
//!
//! let entries = fake.entries().unwrap();
//! assert_eq!(entries[0].id, "0");
//! assert_eq!(entries[0].time.timestamp(), 0);
//! ```

use crate::codec::FrameEncoder;
use crate::core::clock::FakeClock;
use crate::core::entry::Entry;
use crate::core::error::{Abort, LoggerError, Result};
use crate::core::id_allocator::SequentialIdAllocator;
use crate::core::logger::Logger;
use crate::core::specification::Specification;
use crate::core::terminator::RecordingTerminator;
use crate::reader::{BlockingReader, StreamDecoder};
use parking_lot::Mutex;
use std::io::{self, Cursor, Write};
use std::ops::Deref;
use std::sync::Arc;

/// Clonable byte sink over one mutex-guarded buffer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct FakeLogger {
    logger: Logger,
    buffer: SharedBuffer,
    clock: Arc<FakeClock>,
    terminator: Arc<RecordingTerminator>,
}

impl FakeLogger {
    pub fn new(specification: Specification) -> Result<Self> {
        let buffer = SharedBuffer::new();
        let clock = Arc::new(FakeClock::new(0));
        let terminator = Arc::new(RecordingTerminator::new());

        let logger = Logger::builder()
            .specification(specification)
            .sink(buffer.clone())
            .encoder(FrameEncoder)
            .id_allocator(Arc::new(SequentialIdAllocator::new()))
            .clock(clock.clone())
            .terminator(terminator.clone())
            .build()?;

        Ok(Self {
            logger,
            buffer,
            clock,
            terminator,
        })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Advance the clock for every entry logged from now on
    pub fn add_time_secs(&self, secs: i64) {
        self.clock.add_secs(secs);
    }

    /// Raw framed bytes written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.snapshot()
    }

    /// Fatal and Panic aborts raised through the infallible API
    pub fn aborts(&self) -> Vec<Abort> {
        self.terminator.aborts()
    }

    /// Decode everything written so far
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let decoder = StreamDecoder::builder()
            .registry(self.logger.registry().clone())
            .build(Cursor::new(self.buffer.snapshot()))?;
        BlockingReader::new(decoder).entries()
    }

    /// Compare decoded entries with `expected`, optionally ignoring ids and times
    pub fn check_entries_equal(&self, expected: &[Entry], check_id: bool, check_time: bool) -> Result<()> {
        let actual = self.entries()?;
        if actual.len() != expected.len() {
            return Err(LoggerError::other(format!(
                "expected {} entries, got {}",
                expected.len(),
                actual.len()
            )));
        }
        for (i, (want, got)) in expected.iter().zip(&actual).enumerate() {
            if !want.matches(got, check_id, check_time) {
                return Err(LoggerError::other(format!(
                    "entry {} differs: expected {:?}, got {:?}",
                    i, want, got
                )));
            }
        }
        Ok(())
    }
}

impl Deref for FakeLogger {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}
