//! Core logger types and traits

pub mod clock;
pub mod entry;
pub mod entry_writer;
pub mod error;
pub mod events;
pub mod fields;
pub mod filter;
pub mod global;
pub mod id_allocator;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod payload;
pub mod registry;
pub mod sampling;
pub mod specification;
pub mod terminator;
pub mod unstructured;

pub use clock::{Clock, FakeClock, SystemClock};
pub use entry::Entry;
pub use entry_writer::EntryWriter;
pub use error::{Abort, LoggerError, Result};
pub use events::{ErrorEvent, UnstructuredEvent};
pub use fields::{FieldValue, Fields};
pub use filter::{include_entry, Filter, LevelFilter, RequireContextFilter, SharedFilter};
pub use global::{global, set_logger, take_logger, with_global};
pub use id_allocator::{IdAllocator, SequentialIdAllocator, UuidAllocator};
pub use level::Level;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::{DecoderMetrics, LoggerMetrics};
pub use payload::{Context, Event, Payload, Value};
pub use registry::{default_event_types, Namespace, TypeRegistry};
pub use sampling::{SampleFilter, SamplerMetrics, SamplingConfig};
pub use specification::{DecodeFn, Specification, TypeDescriptor};
pub use terminator::{ProcessTerminator, RecordingTerminator, Terminator};
pub use unstructured::UnstructuredLogger;
