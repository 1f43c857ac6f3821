//! Aggregator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime of cached filesystem listings.
pub const DEFAULT_FILE_SYSTEM_TTL: Duration = Duration::from_secs(10);

/// Default lifetime of cached disk layouts.
pub const DEFAULT_DISK_LAYOUT_TTL: Duration = Duration::from_secs(30);

/// Default lifetime of cached battery readings.
pub const DEFAULT_BATTERY_TTL: Duration = Duration::from_secs(10);

/// Cache lifetimes for the expensive, slow-changing sources.
///
/// A zero TTL disables caching for that source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub file_system_ttl: Duration,
    pub disk_layout_ttl: Duration,
    pub battery_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            file_system_ttl: DEFAULT_FILE_SYSTEM_TTL,
            disk_layout_ttl: DEFAULT_DISK_LAYOUT_TTL,
            battery_ttl: DEFAULT_BATTERY_TTL,
        }
    }
}

impl AggregatorConfig {
    /// Set how long filesystem listings are reused.
    pub fn with_file_system_ttl(mut self, ttl: Duration) -> Self {
        self.file_system_ttl = ttl;
        self
    }

    /// Set how long disk layouts are reused.
    pub fn with_disk_layout_ttl(mut self, ttl: Duration) -> Self {
        self.disk_layout_ttl = ttl;
        self
    }

    /// Set how long battery readings are reused.
    pub fn with_battery_ttl(mut self, ttl: Duration) -> Self {
        self.battery_ttl = ttl;
        self
    }

    /// Configuration with every cache disabled.
    pub fn uncached() -> Self {
        Self {
            file_system_ttl: Duration::ZERO,
            disk_layout_ttl: Duration::ZERO,
            battery_ttl: Duration::ZERO,
        }
    }
}
