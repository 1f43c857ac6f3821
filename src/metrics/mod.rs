//! System metrics sources and data structures.
//!
//! This module defines the snapshot data model, the [`MetricsProvider`]
//! capability interface every telemetry source sits behind, and the
//! sysinfo-backed implementation used on real hosts.

pub mod collector;
pub mod data;
pub mod probes;
pub mod traits;

// Re-export commonly used items
pub use collector::SysinfoProvider;
pub use data::Snapshot;
pub use traits::{MetricResult, MetricsProvider};
