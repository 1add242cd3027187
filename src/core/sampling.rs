//! Probabilistic sampling filter for high-volume streams
//!
//! Samples a configurable fraction of entries while levels listed in
//! `always_sample` pass unconditionally.
//!
//! # Example
//!
//! ```
//! use rust_typed_logger::prelude::*;
//!
//! let filter = SampleFilter::new(
//!     SamplingConfig::new(0.1).with_always_sample(vec![Level::Warn, Level::Error]),
//! );
//! assert_eq!(filter.config().rate, 0.1);
//! ```

use super::entry::Entry;
use super::filter::Filter;
use super::level::Level;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Configuration for entry sampling
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Sample rate between 0.0 and 1.0
    ///
    /// - 1.0 = no sampling (include everything)
    /// - 0.1 = include 10% of entries
    /// - 0.0 = drop everything except `always_sample` levels
    pub rate: f64,

    /// Levels that are never sampled out
    pub always_sample: Vec<Level>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            always_sample: vec![Level::Error, Level::Fatal, Level::Panic],
        }
    }
}

impl SamplingConfig {
    /// Create a config with the given rate, clamped to `0.0..=1.0`
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_always_sample(mut self, levels: Vec<Level>) -> Self {
        self.always_sample = levels;
        self
    }
}

/// Counters for sampling decisions
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.sampled_count() + self.dropped_count()
    }

    /// Observed fraction of included entries; 1.0 before any decision
    pub fn effective_sample_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            1.0
        } else {
            self.sampled_count() as f64 / total as f64
        }
    }

    fn record(&self, sampled: bool) -> bool {
        let counter = if sampled {
            &self.sampled_count
        } else {
            &self.dropped_count
        };
        counter.fetch_add(1, Ordering::Relaxed);
        sampled
    }
}

/// Filter that keeps a random fraction of entries
#[derive(Debug)]
pub struct SampleFilter {
    config: SamplingConfig,
    metrics: SamplerMetrics,
}

impl SampleFilter {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            metrics: SamplerMetrics::new(),
        }
    }

    pub fn should_sample(&self, level: Level) -> bool {
        if self.config.always_sample.contains(&level) || self.config.rate >= 1.0 {
            return self.metrics.record(true);
        }
        if self.config.rate <= 0.0 {
            return self.metrics.record(false);
        }
        let sample = rand::thread_rng().gen::<f64>() < self.config.rate;
        self.metrics.record(sample)
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

impl Filter for SampleFilter {
    fn include(&self, entry: &Entry) -> bool {
        self.should_sample(entry.level)
    }
}
