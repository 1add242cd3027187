//! # Rust Typed Logger
//!
//! Structured logging where every context and event is a typed Rust value
//! that survives a trip through a byte stream.
//!
//! ## Features
//!
//! - **Typed entries**: contexts and events are any serde type declared in a
//!   [`Specification`]; undeclared types are rejected at the call site
//! - **Self-describing wire format**: each entry carries the wire key of
//!   every payload type, framed with a length prefix and a separator
//! - **Streaming reads**: a background [`StreamDecoder`] rebuilds entries
//!   from any `Read` source and can be cancelled between frames
//! - **Explicit severity control**: Fatal and Panic are returned as
//!   [`Abort`] values and handed to an injectable [`Terminator`]
//!
//! ## Example
//!
//! ```
//! use rust_typed_logger::fake::FakeLogger;
//! use rust_typed_logger::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct RequestId(String);
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Foo {
//!     one: String,
//!     two: i64,
//! }
//!
//! let spec = Specification::new().context::<RequestId>().event::<Foo>();
//! let fake = FakeLogger::new(spec).unwrap();
//! fake.with_context(RequestId("bar".into())).info(Foo { one: "one".into(), two: 2 });
//!
//! let entries = fake.entries().unwrap();
//! assert_eq!(entries[0].event.downcast_ref::<Foo>().unwrap().two, 2);
//! ```

pub mod codec;
pub mod core;
pub mod fake;
pub mod macros;
pub mod reader;

pub mod prelude {
    pub use crate::codec::{
        Decoder, Encoder, EntryCodec, FrameDecoder, FrameEncoder, JsonMarshaller, LineDecoder,
        LineEncoder, Marshaller, Unmarshaller,
    };
    pub use crate::core::{
        Abort, Clock, Context, Entry, EntryWriter, ErrorEvent, Event, FakeClock, FieldValue,
        Fields, Filter, IdAllocator, Level, LevelFilter, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, Namespace, Payload, RecordingTerminator, RequireContextFilter, Result,
        SampleFilter, SamplingConfig, SequentialIdAllocator, Specification, SystemClock,
        Terminator, TypeDescriptor, TypeRegistry, UnstructuredEvent, UnstructuredLogger,
        UuidAllocator, Value,
    };
    pub use crate::reader::{
        BlockingReader, CancelHandle, DecoderState, Drained, StreamDecoder, StreamDecoderBuilder,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use crate::codec::{EntryCodec, FrameDecoder, FrameEncoder, JsonMarshaller, Marshaller};
pub use crate::core::{
    global, set_logger, take_logger, with_global, Abort, Clock, Context, DecoderMetrics, Entry,
    EntryWriter, ErrorEvent, Event, FieldValue, Fields, Filter, IdAllocator, Level, LevelFilter,
    Logger, LoggerBuilder, LoggerError, LoggerMetrics, Namespace, Payload, ProcessTerminator,
    RecordingTerminator, RequireContextFilter, Result, SampleFilter, SamplerMetrics,
    SamplingConfig, Specification, Terminator, TypeDescriptor, TypeRegistry, UnstructuredEvent,
    UnstructuredLogger, Value,
};
pub use crate::reader::{
    BlockingReader, DecoderState, Drained, StreamDecoder, StreamDecoderBuilder,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
