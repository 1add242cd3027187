//! Synchronous drain of a stream decoder
//!
//! Meant for finite inputs and tests: [`BlockingReader::drain`] blocks until
//! the decoder's queue closes, so it must not be pointed at a live stream.

use super::stream_decoder::{CancelHandle, StreamDecoder};
use crate::core::entry::Entry;
use crate::core::error::{LoggerError, Result};

/// Everything a drain produced, in delivery order
#[derive(Debug, Default)]
pub struct Drained {
    pub entries: Vec<Entry>,
    pub errors: Vec<LoggerError>,
}

impl Drained {
    /// All errors combined into one, or `None` if there were none
    pub fn error(&mut self) -> Option<LoggerError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(LoggerError::Aggregate(std::mem::take(&mut self.errors)))
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Entries if nothing failed, else the combined error
    pub fn into_result(mut self) -> Result<Vec<Entry>> {
        match self.error() {
            Some(error) => Err(error),
            None => Ok(self.entries),
        }
    }
}

type EntryHook<'a> = Box<dyn FnMut(&Entry, &CancelHandle) + 'a>;

/// Drains a [`StreamDecoder`] to completion
pub struct BlockingReader<'a> {
    decoder: StreamDecoder,
    on_entry: Option<EntryHook<'a>>,
}

impl<'a> BlockingReader<'a> {
    pub fn new(decoder: StreamDecoder) -> Self {
        Self {
            decoder,
            on_entry: None,
        }
    }

    /// Observe each delivered entry as it arrives, with the means to cancel
    #[must_use = "builder methods return a new value"]
    pub fn on_entry<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Entry, &CancelHandle) + 'a,
    {
        self.on_entry = Some(Box::new(hook));
        self
    }

    /// Block until the queue closes, collecting entries and errors
    pub fn drain(mut self) -> Drained {
        let cancel = self.decoder.cancel_handle();
        let mut drained = Drained::default();

        while let Some(result) = self.decoder.recv() {
            match result {
                Ok(entry) => {
                    if let Some(hook) = self.on_entry.as_mut() {
                        hook(&entry, &cancel);
                    }
                    drained.entries.push(entry);
                }
                Err(error) => drained.errors.push(error),
            }
        }

        tracing::debug!(
            entries = drained.entries.len(),
            errors = drained.errors.len(),
            state = %self.decoder.state(),
            "stream drained"
        );
        drained
    }

    /// Shorthand for `drain().into_result()`
    pub fn entries(self) -> Result<Vec<Entry>> {
        self.drain().into_result()
    }
}
