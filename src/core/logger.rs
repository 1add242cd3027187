//! Main logger implementation
//!
//! A [`Logger`] is an immutable value: attaching a context returns a new
//! logger sharing the same sink, registry and collaborators, so loggers can
//! be branched and handed across threads freely. Every emission runs in the
//! caller's thread; ordering between calls is the caller's program order.

use super::{
    clock::{Clock, SystemClock},
    entry::Entry,
    entry_writer::EntryWriter,
    error::{Abort, LoggerError, Result},
    events::{ErrorEvent, UnstructuredEvent},
    filter::{include_entry, Filter, LevelFilter, SharedFilter},
    id_allocator::{IdAllocator, UuidAllocator},
    level::Level,
    metrics::LoggerMetrics,
    payload::{Context, Payload, Value},
    registry::{Namespace, TypeRegistry},
    specification::Specification,
    terminator::{ProcessTerminator, Terminator},
    unstructured::UnstructuredLogger,
};
use crate::codec::{EntryCodec, Encoder, Marshaller};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

type Sink = Box<dyn Write + Send>;

struct Shared {
    sink: Mutex<Sink>,
    registry: TypeRegistry,
    marshaller: Arc<dyn Marshaller>,
    encoder: Option<Arc<dyn Encoder>>,
    filters: Vec<SharedFilter>,
    ids: Arc<dyn IdAllocator>,
    clock: Arc<dyn Clock>,
    terminator: Arc<dyn Terminator>,
    metrics: LoggerMetrics,
}

#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    contexts: Arc<Vec<Context>>,
}

impl Logger {
    /// Logger writing newline-terminated entries to stderr
    pub fn new(specification: &Specification) -> Result<Self> {
        LoggerBuilder::new()
            .specification(specification.clone())
            .build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_typed_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .specification(Specification::new())
    ///     .sink(std::io::sink())
    ///     .encoder(FrameEncoder)
    ///     .level(Level::Warn)
    ///     .build()
    ///     .unwrap();
    /// assert!(logger.contexts().is_empty());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Logger with `context` appended, or a validation error
    pub fn try_with_context<C: Payload>(&self, context: C) -> Result<Logger> {
        self.try_with_context_value(Value::new(context))
    }

    pub fn try_with_context_value(&self, context: Context) -> Result<Logger> {
        self.shared.registry.validate(Namespace::Context, &context)?;
        let mut contexts = Vec::with_capacity(self.contexts.len() + 1);
        contexts.extend(self.contexts.iter().cloned());
        contexts.push(context);
        Ok(Logger {
            shared: Arc::clone(&self.shared),
            contexts: Arc::new(contexts),
        })
    }

    /// Logger with `context` appended
    ///
    /// # Panics
    ///
    /// If the context's type was not declared in the specification.
    #[must_use]
    pub fn with_context<C: Payload>(&self, context: C) -> Logger {
        self.try_with_context(context)
            .unwrap_or_else(|e| panic!("invalid context: {}", e))
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.shared.registry
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Validate, build, marshal and write one entry
    ///
    /// Returns the bytes written to the sink (0 when filtered out). Fatal
    /// and Panic entries are written first when the filters include them,
    /// then reported as `Err(LoggerError::Abort(..))` whatever the filter
    /// outcome; the caller decides how to stop.
    pub fn emit<E: Payload>(&self, level: Level, event: E) -> Result<usize> {
        self.emit_value(level, Value::new(event))
    }

    pub fn emit_value(&self, level: Level, event: Value) -> Result<usize> {
        self.validate_event(&event)?;
        let entry = self.entry(level, event, None);
        self.write_entry(&entry)
    }

    /// Emit and act on the outcome instead of returning it
    ///
    /// Aborts go to the terminator and validation errors panic. Sink
    /// failures are reported through `tracing` and counted.
    pub fn log<E: Payload>(&self, level: Level, event: E) {
        let result = self.emit(level, event);
        self.settle(level, result);
    }

    /// Log a plain text message as an [`UnstructuredEvent`]
    pub fn log_message(&self, level: Level, message: impl Into<String>) {
        self.log(level, UnstructuredEvent::new(message));
    }

    #[inline]
    pub fn debug<E: Payload>(&self, event: E) {
        self.log(Level::Debug, event);
    }

    #[inline]
    pub fn info<E: Payload>(&self, event: E) {
        self.log(Level::Info, event);
    }

    #[inline]
    pub fn warn<E: Payload>(&self, event: E) {
        self.log(Level::Warn, event);
    }

    #[inline]
    pub fn error<E: Payload>(&self, event: E) {
        self.log(Level::Error, event);
    }

    /// Write at Fatal, then hand control to the terminator
    #[inline]
    pub fn fatal<E: Payload>(&self, event: E) {
        self.log(Level::Fatal, event);
    }

    /// Write at Panic, then hand control to the terminator
    #[inline]
    pub fn panic<E: Payload>(&self, event: E) {
        self.log(Level::Panic, event);
    }

    /// Log an error's text as an [`ErrorEvent`] at Error level
    pub fn error_event(&self, error: &dyn std::error::Error) {
        self.error(ErrorEvent::from_error(error));
    }

    /// Byte sink turning each write into an entry carrying the written bytes
    pub fn writer<E: Payload>(&self, level: Level, event: E) -> Result<EntryWriter> {
        let event = Value::new(event);
        self.validate_event(&event)?;
        Ok(EntryWriter::new(self.clone(), level, event))
    }

    pub fn debug_writer<E: Payload>(&self, event: E) -> EntryWriter {
        self.writer_or_panic(Level::Debug, event)
    }

    pub fn info_writer<E: Payload>(&self, event: E) -> EntryWriter {
        self.writer_or_panic(Level::Info, event)
    }

    pub fn warn_writer<E: Payload>(&self, event: E) -> EntryWriter {
        self.writer_or_panic(Level::Warn, event)
    }

    pub fn error_writer<E: Payload>(&self, event: E) -> EntryWriter {
        self.writer_or_panic(Level::Error, event)
    }

    fn writer_or_panic<E: Payload>(&self, level: Level, event: E) -> EntryWriter {
        self.writer(level, event)
            .unwrap_or_else(|e| panic!("invalid event: {}", e))
    }

    /// Logger for free-form messages with key-value fields
    pub fn unstructured(&self) -> UnstructuredLogger {
        UnstructuredLogger::new(self.clone())
    }

    pub fn flush(&self) -> Result<()> {
        self.shared
            .sink
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing sink", e))
    }

    fn validate_event(&self, event: &Value) -> Result<()> {
        self.shared.registry.validate(Namespace::Event, event)
    }

    pub(crate) fn entry(&self, level: Level, event: Value, writer_output: Option<Vec<u8>>) -> Entry {
        Entry {
            id: self.shared.ids.allocate(),
            time: self.shared.clock.now(),
            level,
            contexts: self.contexts.as_ref().clone(),
            event,
            writer_output,
        }
    }

    /// Write path shared by `emit` and entry writers; no validation
    pub(crate) fn write_entry(&self, entry: &Entry) -> Result<usize> {
        let bytes = match self.shared.marshaller.marshal(entry) {
            Ok(bytes) => bytes,
            Err(e) if entry.level.aborts() => {
                tracing::error!(error = %e, level = %entry.level, "failed to marshal entry before abort");
                self.shared.metrics.record_abort();
                return Err(LoggerError::Abort(Abort {
                    level: entry.level,
                    entry: e.to_string().into_bytes(),
                }));
            }
            Err(e) => return Err(e),
        };

        let written = if include_entry(&self.shared.filters, entry) {
            match self.write_bytes(&bytes) {
                Ok(written) => written,
                Err(e) if entry.level.aborts() => {
                    tracing::error!(error = %e, level = %entry.level, "failed to write entry before abort");
                    0
                }
                Err(e) => return Err(e),
            }
        } else {
            self.shared.metrics.record_filtered();
            0
        };

        if entry.level.aborts() {
            self.shared.metrics.record_abort();
            return Err(LoggerError::Abort(Abort {
                level: entry.level,
                entry: bytes,
            }));
        }
        Ok(written)
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<usize> {
        let mut sink = self.shared.sink.lock();
        let result = match &self.shared.encoder {
            Some(encoder) => encoder.encode(&mut *sink, bytes),
            None => write_line(&mut *sink, bytes),
        };
        match &result {
            Ok(_) => {
                self.shared.metrics.record_written();
            }
            Err(_) => {
                self.shared.metrics.record_write_failure();
            }
        }
        result
    }

    pub(crate) fn settle(&self, level: Level, result: Result<usize>) {
        match result {
            Ok(_) => {}
            Err(LoggerError::Abort(abort)) => self.shared.terminator.terminate(abort),
            Err(e) if e.is_validation() => panic!("invalid event: {}", e),
            Err(e) => tracing::error!(error = %e, level = %level, "failed to log entry"),
        }
    }
}

fn write_line(sink: &mut dyn Write, bytes: &[u8]) -> Result<usize> {
    let mut line = Vec::with_capacity(bytes.len() + 1);
    line.extend_from_slice(bytes);
    line.push(b'\n');
    sink.write_all(&line)
        .map_err(|e| LoggerError::io_operation("writing entry", e))?;
    Ok(line.len())
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("contexts", &self.contexts)
            .field("filters", &self.shared.filters.len())
            .field("framed", &self.shared.encoder.is_some())
            .field("metrics", &self.shared.metrics)
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// Defaults: empty specification, stderr sink, [`EntryCodec`] marshaller,
/// newline-terminated output, no filters, UUID ids, wall clock and the
/// process terminator.
///
/// # Example
/// ```
/// use rust_typed_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .sink(Vec::new())
///     .id_allocator(Arc::new(SequentialIdAllocator::new()))
///     .clock(Arc::new(FakeClock::new(0)))
///     .filter(LevelFilter::info())
///     .build()
///     .unwrap();
/// logger.info(UnstructuredEvent::new("ready"));
/// assert_eq!(logger.metrics().entries_written(), 1);
/// ```
pub struct LoggerBuilder {
    specification: Specification,
    sink: Option<Sink>,
    marshaller: Option<Arc<dyn Marshaller>>,
    encoder: Option<Arc<dyn Encoder>>,
    filters: Vec<SharedFilter>,
    ids: Arc<dyn IdAllocator>,
    clock: Arc<dyn Clock>,
    terminator: Arc<dyn Terminator>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            specification: Specification::new(),
            sink: None,
            marshaller: None,
            encoder: None,
            filters: Vec::new(),
            ids: Arc::new(UuidAllocator),
            clock: Arc::new(SystemClock),
            terminator: Arc::new(ProcessTerminator),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn specification(mut self, specification: Specification) -> Self {
        self.specification = specification;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<W: Write + Send + 'static>(mut self, sink: W) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replace the [`EntryCodec`]; output of other marshallers cannot be decoded
    #[must_use = "builder methods return a new value"]
    pub fn marshaller<M: Marshaller + 'static>(mut self, marshaller: M) -> Self {
        self.marshaller = Some(Arc::new(marshaller));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

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

    /// Shorthand for a [`LevelFilter`] threshold
    #[must_use = "builder methods return a new value"]
    pub fn level(self, level: Level) -> Self {
        self.filter(LevelFilter::new(level))
    }

    #[must_use = "builder methods return a new value"]
    pub fn id_allocator(mut self, ids: Arc<dyn IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Build the Logger; fails if two declared types share a wire key
    pub fn build(self) -> Result<Logger> {
        let registry = TypeRegistry::new(&self.specification)?;
        let marshaller = self
            .marshaller
            .unwrap_or_else(|| Arc::new(EntryCodec::new(registry.clone())));
        let sink = self.sink.unwrap_or_else(|| Box::new(io::stderr()));

        Ok(Logger {
            shared: Arc::new(Shared {
                sink: Mutex::new(sink),
                registry,
                marshaller,
                encoder: self.encoder,
                filters: self.filters,
                ids: self.ids,
                clock: self.clock,
                terminator: self.terminator,
                metrics: LoggerMetrics::new(),
            }),
            contexts: Arc::new(Vec::new()),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decoder, FrameDecoder, FrameEncoder, Unmarshaller};
    use crate::core::clock::FakeClock;
    use crate::core::id_allocator::SequentialIdAllocator;
    use crate::core::terminator::RecordingTerminator;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct RequestId(String);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Foo {
        one: String,
        two: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Undeclared;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn bytes(&self) -> Vec<u8> {
            self.0.lock().clone()
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn spec() -> Specification {
        Specification::new().context::<RequestId>().event::<Foo>()
    }

    fn logger(buffer: &Buffer, terminator: Arc<RecordingTerminator>) -> LoggerBuilder {
        Logger::builder()
            .specification(spec())
            .sink(buffer.clone())
            .id_allocator(Arc::new(SequentialIdAllocator::new()))
            .clock(Arc::new(FakeClock::new(0)))
            .terminator(terminator)
    }

    fn foo() -> Foo {
        Foo {
            one: "one".into(),
            two: 2,
        }
    }

    #[test]
    fn test_with_context_does_not_mutate_receiver() {
        let buffer = Buffer::default();
        let base = logger(&buffer, Arc::new(RecordingTerminator::new())).build().unwrap();
        let child = base.with_context(RequestId("bar".into()));
        let grandchild = child.with_context(RequestId("baz".into()));

        assert!(base.contexts().is_empty());
        assert_eq!(child.contexts().len(), 1);
        assert_eq!(grandchild.contexts().len(), 2);
    }

    #[test]
    fn test_invalid_context_and_event() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new())).build().unwrap();

        assert!(logger.try_with_context(Undeclared).unwrap_err().is_validation());
        assert!(logger.emit(Level::Info, Undeclared).unwrap_err().is_validation());
        assert!(logger.writer(Level::Info, Undeclared).is_err());
        assert!(buffer.bytes().is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid context")]
    fn test_with_context_panics_on_undeclared_type() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new())).build().unwrap();
        let _ = logger.with_context(Undeclared);
    }

    #[test]
    fn test_emit_writes_line_by_default() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new())).build().unwrap();

        let written = logger.emit(Level::Info, foo()).unwrap();
        let bytes = buffer.bytes();
        assert_eq!(written, bytes.len());
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn test_emit_round_trips_through_frames() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new()))
            .encoder(FrameEncoder)
            .build()
            .unwrap()
            .with_context(RequestId("bar".into()));
        logger.info(foo());

        let bytes = buffer.bytes();
        let frame = FrameDecoder::new()
            .decode(&mut bytes.as_slice())
            .unwrap()
            .unwrap();
        let entry = EntryCodec::new(logger.registry().clone())
            .unmarshal(&frame)
            .unwrap();

        assert_eq!(entry.id, "0");
        assert_eq!(entry.time.timestamp(), 0);
        assert_eq!(entry.level, Level::Info);
        assert_eq!(entry.contexts, vec![Value::new(RequestId("bar".into()))]);
        assert_eq!(entry.event.downcast_ref::<Foo>(), Some(&foo()));
    }

    #[test]
    fn test_filtered_entries_are_not_written() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new()))
            .level(Level::Warn)
            .build()
            .unwrap();

        assert_eq!(logger.emit(Level::Info, foo()).unwrap(), 0);
        assert!(buffer.bytes().is_empty());
        assert_eq!(logger.metrics().entries_filtered(), 1);
    }

    #[test]
    fn test_panic_aborts_even_when_filtered() {
        let buffer = Buffer::default();
        let terminator = Arc::new(RecordingTerminator::new());
        let logger = logger(&buffer, terminator.clone())
            .filter(|entry: &Entry| entry.level < Level::Panic)
            .build()
            .unwrap();

        let err = logger.emit(Level::Panic, foo()).unwrap_err();
        assert!(err.is_abort());
        assert!(buffer.bytes().is_empty());

        logger.panic(foo());
        let aborts = terminator.aborts();
        assert_eq!(aborts.len(), 1);
        assert!(aborts[0].is_panic());
        assert!(!aborts[0].entry.is_empty());
    }

    #[test]
    fn test_fatal_writes_then_aborts() {
        let buffer = Buffer::default();
        let terminator = Arc::new(RecordingTerminator::new());
        let logger = logger(&buffer, terminator.clone()).build().unwrap();

        logger.fatal(foo());
        let aborts = terminator.aborts();
        assert_eq!(aborts.len(), 1);
        assert!(aborts[0].is_fatal());

        let mut expected = aborts[0].entry.clone();
        expected.push(b'\n');
        assert_eq!(buffer.bytes(), expected);
        assert_eq!(logger.metrics().aborts(), 1);
    }

    #[test]
    fn test_sink_failure() {
        let logger = Logger::builder()
            .specification(spec())
            .sink(BrokenSink)
            .build()
            .unwrap();

        let err = logger.emit(Level::Info, foo()).unwrap_err();
        assert!(err.is_io());
        logger.info(foo());
        assert_eq!(logger.metrics().write_failures(), 2);
    }

    #[test]
    fn test_fatal_aborts_even_when_sink_fails() {
        let terminator = Arc::new(RecordingTerminator::new());
        let logger = Logger::builder()
            .specification(spec())
            .sink(BrokenSink)
            .terminator(terminator.clone())
            .build()
            .unwrap();

        assert!(logger.emit(Level::Fatal, foo()).unwrap_err().is_abort());
        assert_eq!(logger.metrics().write_failures(), 1);
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct BinaryKeys(std::collections::HashMap<Vec<u8>, u8>);

    fn binary_keys() -> BinaryKeys {
        BinaryKeys([(vec![1u8, 2], 3u8)].into_iter().collect())
    }

    #[test]
    fn test_marshal_failure_still_aborts() {
        let buffer = Buffer::default();
        let terminator = Arc::new(RecordingTerminator::new());
        let logger = Logger::builder()
            .specification(spec().event::<BinaryKeys>())
            .sink(buffer.clone())
            .terminator(terminator.clone())
            .build()
            .unwrap();

        let err = logger.emit(Level::Info, binary_keys()).unwrap_err();
        assert!(!err.is_abort());

        match logger.emit(Level::Fatal, binary_keys()).unwrap_err() {
            LoggerError::Abort(abort) => {
                assert!(abort.is_fatal());
                assert!(!abort.entry.is_empty());
            }
            other => panic!("expected abort, got {}", other),
        }

        logger.fatal(binary_keys());
        logger.panic(binary_keys());
        let aborts = terminator.aborts();
        assert_eq!(aborts.len(), 2);
        assert!(aborts[0].is_fatal());
        assert!(aborts[1].is_panic());
        assert!(buffer.bytes().is_empty());
        assert_eq!(logger.metrics().aborts(), 3);
    }

    #[test]
    fn test_json_marshaller_output() {
        let buffer = Buffer::default();
        let logger = logger(&buffer, Arc::new(RecordingTerminator::new()))
            .marshaller(crate::codec::JsonMarshaller::new())
            .build()
            .unwrap();
        logger.log_message(Level::Warn, "careful");

        let line = String::from_utf8(buffer.bytes()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["level"], "warn");
        assert_eq!(parsed["UnstructuredEvent"]["message"], "careful");
    }

    #[test]
    fn test_build_fails_on_key_collision() {
        use crate::core::specification::TypeDescriptor;

        let spec = Specification::new()
            .with_descriptor(Namespace::Event, TypeDescriptor::with_key::<Foo>("same"))
            .with_descriptor(Namespace::Event, TypeDescriptor::with_key::<RequestId>("same"));
        assert!(matches!(
            Logger::builder().specification(spec).build(),
            Err(LoggerError::KeyCollision { .. })
        ));
    }
}
