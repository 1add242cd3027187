//! `io::Write` adapter that logs every write as an entry

use super::entry::Entry;
use super::error::Result;
use super::level::Level;
use super::logger::Logger;
use super::payload::Event;
use std::io;

/// Byte sink bound to a logger, a level and an event
///
/// Each non-empty write produces one entry whose `writer_output` holds the
/// written bytes. The event was validated when the writer was created.
#[derive(Debug, Clone)]
pub struct EntryWriter {
    logger: Logger,
    level: Level,
    event: Event,
}

impl EntryWriter {
    pub(crate) fn new(logger: Logger, level: Level, event: Event) -> Self {
        Self {
            logger,
            level,
            event,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Fallible form of `write`; aborts are returned, not acted on
    pub fn write_entry(&self, output: &[u8]) -> Result<usize> {
        if output.is_empty() {
            return Ok(0);
        }
        let entry: Entry = self
            .logger
            .entry(self.level, self.event.clone(), Some(output.to_vec()));
        self.logger.write_entry(&entry)
    }
}

impl io::Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_entry(buf) {
            Err(e) if !e.is_abort() => Err(io::Error::other(e)),
            result => {
                self.logger.settle(self.level, result);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.logger.flush().map_err(io::Error::other)
    }
}
