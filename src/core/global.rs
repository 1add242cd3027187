//! Process-wide logger
//!
//! A convenience for code that cannot take a [`Logger`] parameter. The slot
//! starts empty; [`set_logger`] replaces whatever was there, so the last
//! caller wins. Passing loggers explicitly remains the preferred style.

use super::logger::Logger;
use parking_lot::RwLock;

static GLOBAL: RwLock<Option<Logger>> = RwLock::new(None);

/// Install `logger` globally, returning the one it replaced
pub fn set_logger(logger: Logger) -> Option<Logger> {
    GLOBAL.write().replace(logger)
}

/// Remove the global logger
pub fn take_logger() -> Option<Logger> {
    GLOBAL.write().take()
}

/// A handle to the current global logger
pub fn global() -> Option<Logger> {
    GLOBAL.read().clone()
}

/// Run `f` against the global logger without cloning it
pub fn with_global<R>(f: impl FnOnce(&Logger) -> R) -> Option<R> {
    GLOBAL.read().as_ref().map(f)
}
