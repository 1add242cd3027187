//! Log entry structure

use super::level::Level;
use super::payload::{Context, Event, Payload, Value};
use chrono::{DateTime, Utc};

/// One structured log record
///
/// Built by the logger at emission time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub time: DateTime<Utc>,
    pub level: Level,
    /// Contexts in the order they were attached; duplicates allowed
    pub contexts: Vec<Context>,
    pub event: Event,
    /// Bytes written through an entry writer, if this entry came from one
    pub writer_output: Option<Vec<u8>>,
}

impl Entry {
    pub fn new(id: impl Into<String>, time: DateTime<Utc>, level: Level, event: impl Payload) -> Self {
        Self {
            id: id.into(),
            time,
            level,
            contexts: Vec::new(),
            event: Value::new(event),
            writer_output: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Payload) -> Self {
        self.contexts.push(Value::new(context));
        self
    }

    #[must_use]
    pub fn with_writer_output(mut self, output: impl Into<Vec<u8>>) -> Self {
        self.writer_output = Some(output.into());
        self
    }

    /// Whether any attached context equals `context`
    pub fn has_context(&self, context: &Value) -> bool {
        self.contexts.iter().any(|c| c == context)
    }

    /// Compare everything but, optionally, the id and time
    pub fn matches(&self, other: &Entry, check_id: bool, check_time: bool) -> bool {
        (!check_id || self.id == other.id)
            && (!check_time || self.time == other.time)
            && self.level == other.level
            && self.contexts == other.contexts
            && self.event == other.event
            && self.writer_output == other.writer_output
    }
}
