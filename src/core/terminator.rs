//! Termination collaborator for Fatal and Panic entries
//!
//! The logger never exits or unwinds on its own: the fallible
//! [`Logger::emit`](crate::Logger::emit) returns the [`Abort`] to its caller,
//! and the level convenience methods hand it to a [`Terminator`].

use super::error::Abort;
use parking_lot::Mutex;

pub trait Terminator: Send + Sync {
    fn terminate(&self, abort: Abort);
}

/// Exits the process on Fatal and panics on Panic
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, abort: Abort) {
        if abort.is_panic() {
            panic!("{}", String::from_utf8_lossy(&abort.entry));
        }
        tracing::error!(level = %abort.level, "terminating process after fatal entry");
        std::process::exit(1);
    }
}

/// Records aborts instead of acting on them
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    aborts: Mutex<Vec<Abort>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aborts(&self) -> Vec<Abort> {
        self.aborts.lock().clone()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, abort: Abort) {
        self.aborts.lock().push(abort);
    }
}
