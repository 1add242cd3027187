//! Counters for the write and read paths
//!
//! Both structs are lock-free and cheap to update from the hot path;
//! `Clone` takes a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Write-path counters
///
/// # Example
///
/// ```
/// use rust_typed_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.entries_written(), 1);
/// assert_eq!(metrics.entries_filtered(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Entries whose bytes reached the sink
    entries_written: AtomicU64,

    /// Entries excluded by the filter set
    entries_filtered: AtomicU64,

    /// Sink writes that failed
    write_failures: AtomicU64,

    /// Fatal/Panic control transfers raised
    aborts: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            entries_written: AtomicU64::new(0),
            entries_filtered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            aborts: AtomicU64::new(0),
        }
    }

    /// Get the number of entries written to the sink
    #[inline]
    pub fn entries_written(&self) -> u64 {
        self.entries_written.load(Ordering::Relaxed)
    }

    /// Get the number of entries excluded by filters
    #[inline]
    pub fn entries_filtered(&self) -> u64 {
        self.entries_filtered.load(Ordering::Relaxed)
    }

    /// Get the number of failed sink writes
    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Get the number of Fatal/Panic control transfers raised
    #[inline]
    pub fn aborts(&self) -> u64 {
        self.aborts.load(Ordering::Relaxed)
    }

    /// Increment the written counter, returning the previous value
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.entries_written.fetch_add(1, Ordering::Relaxed)
    }

    /// Increment the filtered counter, returning the previous value
    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.entries_filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Increment the write failure counter, returning the previous value
    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Increment the abort counter, returning the previous value
    #[inline]
    pub fn record_abort(&self) -> u64 {
        self.aborts.fetch_add(1, Ordering::Relaxed)
    }
}

impl Clone for LoggerMetrics {
    fn clone(&self) -> Self {
        Self {
            entries_written: AtomicU64::new(self.entries_written()),
            entries_filtered: AtomicU64::new(self.entries_filtered()),
            write_failures: AtomicU64::new(self.write_failures()),
            aborts: AtomicU64::new(self.aborts()),
        }
    }
}

/// Read-path counters
#[derive(Debug, Default)]
pub struct DecoderMetrics {
    frames_decoded: AtomicU64,
    entries_delivered: AtomicU64,
    entries_filtered: AtomicU64,
    errors_published: AtomicU64,
}

impl DecoderMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            frames_decoded: AtomicU64::new(0),
            entries_delivered: AtomicU64::new(0),
            entries_filtered: AtomicU64::new(0),
            errors_published: AtomicU64::new(0),
        }
    }

    /// Get the number of frames split out of the source
    #[inline]
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded.load(Ordering::Relaxed)
    }

    /// Get the number of entries handed to the delivery queue
    #[inline]
    pub fn entries_delivered(&self) -> u64 {
        self.entries_delivered.load(Ordering::Relaxed)
    }

    /// Get the number of decoded entries excluded by filters
    #[inline]
    pub fn entries_filtered(&self) -> u64 {
        self.entries_filtered.load(Ordering::Relaxed)
    }

    /// Get the number of errors delivered in place of entries
    #[inline]
    pub fn errors_published(&self) -> u64 {
        self.errors_published.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_frame(&self) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.entries_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_filtered(&self) {
        self.entries_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_error(&self) {
        self.errors_published.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clone for DecoderMetrics {
    fn clone(&self) -> Self {
        Self {
            frames_decoded: AtomicU64::new(self.frames_decoded()),
            entries_delivered: AtomicU64::new(self.entries_delivered()),
            entries_filtered: AtomicU64::new(self.entries_filtered()),
            errors_published: AtomicU64::new(self.errors_published()),
        }
    }
}
