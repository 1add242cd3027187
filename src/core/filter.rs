//! Entry filters applied on the write and read paths
//!
//! A set of filters composes by logical AND; an empty set includes
//! everything. Filters never influence the Fatal/Panic control transfers,
//! only whether bytes reach the sink or an entry reaches a reader.

use super::entry::Entry;
use super::error::{LoggerError, Result};
use super::level::Level;
use super::payload::{Payload, Value};
use std::str::FromStr;
use std::sync::Arc;

/// Inclusion predicate over entries
pub trait Filter: Send + Sync {
    fn include(&self, entry: &Entry) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Entry) -> bool + Send + Sync,
{
    fn include(&self, entry: &Entry) -> bool {
        self(entry)
    }
}

pub type SharedFilter = Arc<dyn Filter>;

/// True when every filter includes the entry
pub fn include_entry(filters: &[SharedFilter], entry: &Entry) -> bool {
    filters.iter().all(|filter| filter.include(entry))
}

/// Includes entries at or above a threshold level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFilter {
    level: Level,
}

impl LevelFilter {
    /// Create a filter including `level` and everything more severe
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Include everything
    pub const fn debug() -> Self {
        Self::new(Level::Debug)
    }

    /// Include Info and above
    pub const fn info() -> Self {
        Self::new(Level::Info)
    }

    /// Include Warn and above
    pub const fn warn() -> Self {
        Self::new(Level::Warn)
    }

    /// Include Error and above
    pub const fn error() -> Self {
        Self::new(Level::Error)
    }

    /// Include Fatal and Panic
    pub const fn fatal() -> Self {
        Self::new(Level::Fatal)
    }

    /// Include Panic only
    pub const fn panic() -> Self {
        Self::new(Level::Panic)
    }

    /// Get the threshold level
    pub fn level(&self) -> Level {
        self.level
    }
}

/// Threshold from a configuration string such as `"warn"`
impl FromStr for LevelFilter {
    type Err = LoggerError;

    fn from_str(level: &str) -> Result<Self> {
        Ok(Self::new(level.parse()?))
    }
}

impl Filter for LevelFilter {
    fn include(&self, entry: &Entry) -> bool {
        self.level <= entry.level
    }
}

/// Includes entries carrying a given context value
#[derive(Debug, Clone)]
pub struct RequireContextFilter {
    context: Value,
}

impl RequireContextFilter {
    /// Create a filter requiring a context equal to `context`
    pub fn new(context: impl Payload) -> Self {
        Self {
            context: Value::new(context),
        }
    }
}

impl Filter for RequireContextFilter {
    fn include(&self, entry: &Entry) -> bool {
        entry.has_context(&self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::UnstructuredEvent;
    use chrono::Utc;

    fn entry(level: Level) -> Entry {
        Entry::new("0", Utc::now(), level, UnstructuredEvent::new("msg"))
    }

    #[test]
    fn test_empty_filter_set_includes() {
        assert!(include_entry(&[], &entry(Level::Debug)));
    }

    #[test]
    fn test_level_filter_threshold() {
        let filter = LevelFilter::warn();
        assert!(!filter.include(&entry(Level::Info)));
        assert!(filter.include(&entry(Level::Warn)));
        assert!(filter.include(&entry(Level::Panic)));
        assert_eq!("error".parse::<LevelFilter>().unwrap(), LevelFilter::error());
        assert!("loud".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_require_context_filter() {
        let filter = RequireContextFilter::new(42_i64);
        assert!(!filter.include(&entry(Level::Info)));
        assert!(filter.include(&entry(Level::Info).with_context(42_i64)));
        assert!(!filter.include(&entry(Level::Info).with_context(42_u64)));
    }

    #[test]
    fn test_filters_compose_by_and() {
        let filters: Vec<SharedFilter> = vec![
            Arc::new(LevelFilter::info()),
            Arc::new(|e: &Entry| e.contexts.is_empty()),
        ];
        assert!(include_entry(&filters, &entry(Level::Info)));
        assert!(!include_entry(&filters, &entry(Level::Debug)));
        assert!(!include_entry(&filters, &entry(Level::Info).with_context(1_i64)));
    }
}
