//! Free-form text logging on top of the typed logger
//!
//! Messages become [`UnstructuredEvent`]s, which every registry accepts, so
//! this works without declaring anything. Fields are rendered in front of
//! the message as `{key:value ...}` with keys sorted.
//!
//! ```
//! use rust_typed_logger::prelude::*;
//!
//! let logger = Logger::builder().sink(Vec::new()).build().unwrap();
//! let log = logger.unstructured().with_field("port", 8080);
//! assert_eq!(log.render("listening"), "{port:8080} listening");
//! log.info("listening");
//! ```

use super::entry_writer::EntryWriter;
use super::error::Result;
use super::events::UnstructuredEvent;
use super::fields::{FieldValue, Fields};
use super::level::Level;
use super::logger::Logger;
use super::payload::Value;

#[derive(Debug, Clone)]
pub struct UnstructuredLogger {
    logger: Logger,
    fields: Fields,
}

impl UnstructuredLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            fields: Fields::new(),
        }
    }

    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut next = self.clone();
        next.fields.insert(key, value);
        next
    }

    #[must_use]
    pub fn with_fields(&self, fields: &Fields) -> Self {
        let mut next = self.clone();
        next.fields.extend(fields);
        next
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn render(&self, message: &str) -> String {
        self.fields.render(message)
    }

    fn event(&self, message: &str) -> UnstructuredEvent {
        UnstructuredEvent::new(self.render(message))
    }

    /// Fallible form: returns aborts and sink errors to the caller
    pub fn try_log(&self, level: Level, message: impl AsRef<str>) -> Result<usize> {
        self.logger.emit(level, self.event(message.as_ref()))
    }

    pub fn log_message(&self, level: Level, message: impl AsRef<str>) {
        self.logger.log(level, self.event(message.as_ref()));
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log_message(Level::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log_message(Level::Info, message);
    }

    pub fn print(&self, message: impl AsRef<str>) {
        self.info(message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log_message(Level::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log_message(Level::Error, message);
    }

    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log_message(Level::Fatal, message);
    }

    pub fn panic(&self, message: impl AsRef<str>) {
        self.log_message(Level::Panic, message);
    }

    /// Writer whose entries carry only the fields as their message
    pub fn writer(&self, level: Level) -> EntryWriter {
        EntryWriter::new(self.logger.clone(), level, Value::new(self.event("")))
    }

    pub fn debug_writer(&self) -> EntryWriter {
        self.writer(Level::Debug)
    }

    pub fn info_writer(&self) -> EntryWriter {
        self.writer(Level::Info)
    }

    pub fn warn_writer(&self) -> EntryWriter {
        self.writer(Level::Warn)
    }

    pub fn error_writer(&self) -> EntryWriter {
        self.writer(Level::Error)
    }
}
