//! The aggregation engine.
//!
//! Combines independent, failure-prone sources into one snapshot per call
//! and carries the derived state between calls: TTL caches for expensive
//! sources, the throughput estimator and the rolling histories.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod history;
pub mod rate;

// Re-export commonly used items
pub use aggregator::{Aggregator, SharedAggregator};
pub use cache::{CacheEntry, TtlCache};
pub use config::AggregatorConfig;
pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use rate::{RateEstimator, RateSample, RATE_WINDOW};
