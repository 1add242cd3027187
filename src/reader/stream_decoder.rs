//! Background, cancellable frame-to-entry decoding
//!
//! A [`StreamDecoder`] owns its byte source and runs exactly one worker
//! thread over it. The worker reads one frame at a time, rebuilds the entry
//! with an [`EntryCodec`], applies the read-side filters and publishes the
//! outcome on a bounded channel. With the default capacity of zero every
//! publish is a rendezvous with the consumer, so a consumer that stops
//! reading stalls decoding.
//!
//! # Example
//!
//! ```
//! use rust_typed_logger::prelude::*;
//! use std::io::Cursor;
//!
//! let codec = EntryCodec::from_specification(&Specification::new()).unwrap();
//! let entry = Entry::new("0", chrono::Utc::now(), Level::Info, UnstructuredEvent::new("hi"));
//! let mut wire = Vec::new();
//! FrameEncoder.encode(&mut wire, &codec.marshal(&entry).unwrap()).unwrap();
//!
//! let decoder = StreamDecoder::new(&Specification::new(), Cursor::new(wire)).unwrap();
//! let decoded: Vec<_> = decoder.iter().collect();
//! assert_eq!(decoded.len(), 1);
//! assert_eq!(decoded[0].as_ref().unwrap(), &entry);
//! ```

use crate::codec::envelope::{EntryCodec, Unmarshaller};
use crate::codec::frame::{Decoder, FrameDecoder};
use crate::core::entry::Entry;
use crate::core::error::{LoggerError, Result};
use crate::core::filter::{include_entry, Filter, SharedFilter};
use crate::core::metrics::DecoderMetrics;
use crate::core::registry::TypeRegistry;
use crate::core::specification::Specification;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::fmt;
use std::io::{BufReader, Read};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long `close` and `Drop` wait for the worker to stop
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Read buffer placed in front of the byte source
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 256 * 1024;

/// One delivered result: an entry, or the error for one frame
pub type DecodeResult = Result<Entry>;

/// Lifecycle of the decode worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DecoderState {
    Idle = 0,
    Running = 1,
    /// Stopped by [`StreamDecoder::cancel`]
    Cancelled = 2,
    /// The source reached a clean end of stream
    Exhausted = 3,
    /// The source itself failed; the error was published last
    Erred = 4,
    Closed = 5,
}

impl DecoderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DecoderState::Idle,
            1 => DecoderState::Running,
            2 => DecoderState::Cancelled,
            3 => DecoderState::Exhausted,
            4 => DecoderState::Erred,
            _ => DecoderState::Closed,
        }
    }

    /// Whether the worker has stopped producing results
    pub fn is_terminal(self) -> bool {
        !matches!(self, DecoderState::Idle | DecoderState::Running)
    }
}

impl fmt::Display for DecoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecoderState::Idle => "idle",
            DecoderState::Running => "running",
            DecoderState::Cancelled => "cancelled",
            DecoderState::Exhausted => "exhausted",
            DecoderState::Erred => "erred",
            DecoderState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// State shared between the handle, its cancel handles and the worker
#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    state: AtomicU8,
    metrics: DecoderMetrics,
}

impl Shared {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            state: AtomicU8::new(DecoderState::Idle as u8),
            metrics: DecoderMetrics::new(),
        }
    }

    fn state(&self) -> DecoderState {
        DecoderState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Leave `Running` for a terminal state; later transitions are ignored
    fn finish(&self, state: DecoderState) {
        let _ = self.state.compare_exchange(
            DecoderState::Running as u8,
            state as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Requests cancellation of a [`StreamDecoder`] from any thread
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
    wake: Sender<()>,
}

impl CancelHandle {
    /// Stop the worker at the next frame boundary
    ///
    /// Idempotent. A frame already being decoded is finished first, but its
    /// result is dropped unless a consumer has already accepted it.
    pub fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("stream decoder cancellation requested");
        }
        let _ = self.wake.try_send(());
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

/// Background decoder over one byte source
pub struct StreamDecoder {
    receiver: Receiver<DecodeResult>,
    cancel: CancelHandle,
    handle: Option<thread::JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl StreamDecoder {
    /// Framed decoding with no filters and rendezvous delivery
    pub fn new<R>(specification: &Specification, source: R) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        StreamDecoderBuilder::new()
            .specification(specification.clone())
            .build(source)
    }

    #[must_use]
    pub fn builder() -> StreamDecoderBuilder {
        StreamDecoderBuilder::new()
    }

    /// Next result, or `None` once the queue is closed or cancelled
    pub fn recv(&self) -> Option<DecodeResult> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.receiver.recv().ok()
    }

    /// Raw delivery channel
    ///
    /// Unlike [`recv`](Self::recv), reading the channel directly does not
    /// stop at cancellation: a result the worker was already publishing may
    /// still arrive before the channel closes.
    pub fn receiver(&self) -> &Receiver<DecodeResult> {
        &self.receiver
    }

    /// Blocking iterator over results until the queue closes
    pub fn iter(&self) -> impl Iterator<Item = DecodeResult> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    /// Stop decoding; later [`recv`](Self::recv) calls return `None`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clonable handle that cancels this decoder from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Get the current worker state
    pub fn state(&self) -> DecoderState {
        self.cancel.shared.state()
    }

    /// Get the read-path counters
    pub fn metrics(&self) -> &DecoderMetrics {
        &self.cancel.shared.metrics
    }

    /// Cancel the worker and wait up to the shutdown timeout for it to stop
    ///
    /// Returns `false` if the worker panicked or is still blocked on the
    /// source when the timeout expires; it is then detached.
    pub fn close(&mut self) -> bool {
        self.cancel();
        let mut stopped = true;

        if let Some(handle) = self.handle.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        tracing::error!("stream decoder worker panicked");
                        stopped = false;
                    }
                    break;
                }

                if start.elapsed() >= self.shutdown_timeout {
                    tracing::warn!(
                        timeout = ?self.shutdown_timeout,
                        "stream decoder worker did not stop in time, detaching it"
                    );
                    stopped = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        self.cancel
            .shared
            .state
            .store(DecoderState::Closed as u8, Ordering::SeqCst);
        stopped
    }
}

impl Drop for StreamDecoder {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.close();
        }
    }
}

impl fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("state", &self.state())
            .field("metrics", self.metrics())
            .finish()
    }
}

/// Configuration for a [`StreamDecoder`]
///
/// # Example
///
/// ```
/// use rust_typed_logger::prelude::*;
/// use std::io::Cursor;
///
/// let decoder = StreamDecoder::builder()
///     .specification(Specification::new())
///     .decoder(LineDecoder)
///     .filter(LevelFilter::warn())
///     .buffer_size(16)
///     .build(Cursor::new(Vec::new()))
///     .unwrap();
/// assert!(decoder.recv().is_none());
/// ```
pub struct StreamDecoderBuilder {
    specification: Specification,
    registry: Option<TypeRegistry>,
    decoder: Box<dyn Decoder>,
    filters: Vec<SharedFilter>,
    buffer_size: usize,
    read_buffer_capacity: usize,
    shutdown_timeout: Duration,
}

impl StreamDecoderBuilder {
    /// Create a builder with framed decoding and rendezvous delivery
    pub fn new() -> Self {
        Self {
            specification: Specification::new(),
            registry: None,
            decoder: Box::new(FrameDecoder::new()),
            filters: Vec::new(),
            buffer_size: 0,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Types the stream may contain
    #[must_use = "builder methods return a new value"]
    pub fn specification(mut self, specification: Specification) -> Self {
        self.specification = specification;
        self
    }

    /// Reuse an existing registry instead of building one from the specification
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Framing to split the source with; [`FrameDecoder`] by default
    #[must_use = "builder methods return a new value"]
    pub fn decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Add a filter; delivered entries must pass all of them
    #[must_use = "builder methods return a new value"]
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filters(mut self, filters: impl IntoIterator<Item = SharedFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Delivery queue capacity; 0 hands each result directly to a consumer
    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Size of the buffered reader wrapping the source
    #[must_use = "builder methods return a new value"]
    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity.max(1);
        self
    }

    /// How long [`StreamDecoder::close`] waits for the worker
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Take ownership of `source` and start the worker
    pub fn build<R>(self, source: R) -> Result<StreamDecoder>
    where
        R: Read + Send + 'static,
    {
        let registry = match self.registry {
            Some(registry) => registry,
            None => TypeRegistry::new(&self.specification)?,
        };

        let (sender, receiver) = bounded(self.buffer_size);
        let (wake_tx, wake_rx) = bounded(1);
        let shared = Arc::new(Shared::new());

        let worker = Worker {
            source: BufReader::with_capacity(self.read_buffer_capacity, source),
            decoder: self.decoder,
            codec: EntryCodec::new(registry),
            filters: self.filters,
            sender,
            wake: wake_rx,
            shared: Arc::clone(&shared),
        };

        shared
            .state
            .store(DecoderState::Running as u8, Ordering::SeqCst);
        let handle = thread::Builder::new()
            .name("stream-decoder".into())
            .spawn(move || worker.run())
            .map_err(|e| LoggerError::io_operation("spawning stream decoder worker", e))?;

        Ok(StreamDecoder {
            receiver,
            cancel: CancelHandle {
                shared,
                wake: wake_tx,
            },
            handle: Some(handle),
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}

impl Default for StreamDecoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Worker<R> {
    source: BufReader<R>,
    decoder: Box<dyn Decoder>,
    codec: EntryCodec,
    filters: Vec<SharedFilter>,
    sender: Sender<DecodeResult>,
    wake: Receiver<()>,
    shared: Arc<Shared>,
}

impl<R: Read> Worker<R> {
    fn run(mut self) {
        tracing::debug!("stream decoder worker started");

        loop {
            if self.shared.is_cancelled() {
                self.shared.finish(DecoderState::Cancelled);
                break;
            }

            let frame = match self.decoder.decode(&mut self.source) {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.shared.finish(DecoderState::Exhausted);
                    break;
                }
                // A failing source would fail again on every retry, so this
                // is the one stream error that ends the loop.
                Err(e) if e.is_io() => {
                    tracing::warn!(error = %e, "stream source failed");
                    if self.publish_error(e) {
                        self.shared.finish(DecoderState::Erred);
                    }
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "dropping malformed frame");
                    if self.publish_error(e) {
                        continue;
                    }
                    break;
                }
            };
            self.shared.metrics.record_frame();

            let delivered = match self.codec.unmarshal(&frame) {
                Ok(entry) if include_entry(&self.filters, &entry) => {
                    self.shared.metrics.record_delivered();
                    self.publish(Ok(entry))
                }
                Ok(_) => {
                    self.shared.metrics.record_filtered();
                    true
                }
                Err(e) => {
                    tracing::debug!(error = %e, "cannot rebuild entry from frame");
                    self.publish_error(e)
                }
            };
            if !delivered {
                break;
            }
        }

        if self.shared.is_cancelled() {
            self.shared.finish(DecoderState::Cancelled);
        }
        tracing::debug!(state = %self.shared.state(), "stream decoder worker stopped");
    }

    fn publish_error(&self, error: LoggerError) -> bool {
        self.shared.metrics.record_error();
        self.publish(Err(error))
    }

    /// Hand one result to the queue; false once the worker must stop
    fn publish(&self, result: DecodeResult) -> bool {
        if self.shared.is_cancelled() {
            return false;
        }
        select! {
            send(self.sender, result) -> sent => sent.is_ok(),
            recv(self.wake) -> _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::envelope::Marshaller;
    use crate::codec::frame::{Encoder, FrameEncoder, LineDecoder};
    use crate::core::events::UnstructuredEvent;
    use crate::core::filter::LevelFilter;
    use crate::core::level::Level;
    use chrono::{TimeZone, Utc};
    use std::io::{self, Cursor};

    fn entry(id: &str, level: Level) -> Entry {
        Entry::new(
            id,
            Utc.timestamp_opt(0, 0).unwrap(),
            level,
            UnstructuredEvent::new(format!("message {}", id)),
        )
    }

    fn framed(entries: &[Entry]) -> Vec<u8> {
        let codec = EntryCodec::from_specification(&Specification::new()).unwrap();
        let mut wire = Vec::new();
        for entry in entries {
            FrameEncoder
                .encode(&mut wire, &codec.marshal(entry).unwrap())
                .unwrap();
        }
        wire
    }

    struct FailingSource;

    impl Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_decodes_in_order_then_exhausts() {
        let entries: Vec<_> = (0..5).map(|i| entry(&i.to_string(), Level::Info)).collect();
        let decoder = StreamDecoder::new(&Specification::new(), Cursor::new(framed(&entries))).unwrap();

        let decoded: Vec<Entry> = decoder.iter().map(|r| r.unwrap()).collect();
        assert_eq!(decoded, entries);
        assert_eq!(decoder.metrics().frames_decoded(), 5);

        let start = Instant::now();
        while decoder.state() == DecoderState::Running && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(decoder.state(), DecoderState::Exhausted);
    }

    #[test]
    fn test_empty_source() {
        let decoder = StreamDecoder::new(&Specification::new(), Cursor::new(Vec::new())).unwrap();
        assert!(decoder.recv().is_none());
    }

    #[test]
    fn test_filtered_entries_are_not_delivered() {
        let entries = vec![
            entry("0", Level::Debug),
            entry("1", Level::Warn),
            entry("2", Level::Info),
            entry("3", Level::Error),
        ];
        let decoder = StreamDecoder::builder()
            .filter(LevelFilter::warn())
            .build(Cursor::new(framed(&entries)))
            .unwrap();

        let ids: Vec<String> = decoder.iter().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(decoder.metrics().entries_filtered(), 2);
        assert_eq!(decoder.metrics().entries_delivered(), 2);
    }

    #[test]
    fn test_unknown_type_is_published_and_skipped() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Custom(u8);

        let spec = Specification::new().event::<Custom>();
        let codec = EntryCodec::from_specification(&spec).unwrap();
        let mut wire = Vec::new();
        let custom = Entry::new("0", Utc.timestamp_opt(0, 0).unwrap(), Level::Info, Custom(1));
        FrameEncoder.encode(&mut wire, &codec.marshal(&custom).unwrap()).unwrap();
        wire.extend(framed(&[entry("1", Level::Info)]));

        let decoder = StreamDecoder::new(&Specification::new(), Cursor::new(wire)).unwrap();
        let results: Vec<_> = decoder.iter().collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(LoggerError::UnknownType { .. })));
        assert_eq!(results[1].as_ref().unwrap().id, "1");
    }

    #[test]
    fn test_source_error_ends_stream() {
        let decoder = StreamDecoder::new(&Specification::new(), FailingSource).unwrap();
        let results: Vec<_> = decoder.iter().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap_err().is_io());
        assert_eq!(decoder.state(), DecoderState::Erred);
    }

    #[test]
    fn test_cancel_after_first_entry() {
        let entries: Vec<_> = (0..3).map(|i| entry(&i.to_string(), Level::Info)).collect();
        let decoder = StreamDecoder::new(&Specification::new(), Cursor::new(framed(&entries))).unwrap();

        assert_eq!(decoder.recv().unwrap().unwrap(), entries[0]);
        decoder.cancel();
        assert!(decoder.recv().is_none());
        assert!(decoder.cancel_handle().is_cancelled());
    }

    #[test]
    fn test_close_joins_worker() {
        let entries: Vec<_> = (0..3).map(|i| entry(&i.to_string(), Level::Info)).collect();
        let mut decoder =
            StreamDecoder::new(&Specification::new(), Cursor::new(framed(&entries))).unwrap();

        assert!(decoder.close());
        assert_eq!(decoder.state(), DecoderState::Closed);
        assert!(decoder.recv().is_none());
    }

    #[test]
    fn test_line_decoder_path() {
        let codec = EntryCodec::from_specification(&Specification::new()).unwrap();
        let mut wire = codec.marshal(&entry("0", Level::Info)).unwrap();
        wire.push(b'\n');

        let decoder = StreamDecoder::builder()
            .decoder(LineDecoder)
            .build(Cursor::new(wire))
            .unwrap();
        let decoded: Vec<_> = decoder.iter().collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_ref().unwrap().id, "0");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(DecoderState::Exhausted.to_string(), "exhausted");
        assert!(DecoderState::Cancelled.is_terminal());
        assert!(!DecoderState::Running.is_terminal());
    }
}
