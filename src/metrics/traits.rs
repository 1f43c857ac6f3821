//! Traits for system metrics collection.

use crate::error::SystemError;
use crate::metrics::data::*;
use async_trait::async_trait;

/// Outcome of one source adapter call: the reading, or the reason it failed.
pub type MetricResult<T> = std::result::Result<T, SystemError>;

/// Capability interface over the host's telemetry sources.
///
/// Each operation wraps exactly one external query and reports its failure
/// as `Err` instead of panicking. Implementations do not retry; the next
/// aggregation pass simply asks again.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// CPU model, core count, hostname, platform, uptime and load.
    async fn host_info(&self) -> MetricResult<HostInfo>;

    /// Overall CPU usage percentage since the previous call.
    async fn cpu_usage(&self) -> MetricResult<f32>;

    /// System memory totals.
    async fn memory(&self) -> MetricResult<MemoryReading>;

    /// Usage of the root filesystem.
    async fn disk_usage(&self) -> MetricResult<DiskStats>;

    /// Network interfaces with their lifetime byte counts.
    async fn network_interfaces(&self) -> MetricResult<Vec<NetworkInterface>>;

    /// Absolute rx/tx counters used for throughput estimation.
    async fn network_counters(&self) -> MetricResult<Vec<InterfaceCounters>>;

    /// CPU temperature in Celsius.
    async fn temperature(&self) -> MetricResult<f32>;

    /// Battery state.
    async fn battery(&self) -> MetricResult<BatteryStatus>;

    /// Process counts by state.
    async fn process_counts(&self) -> MetricResult<ProcessCounts>;

    /// Mounted filesystems.
    async fn file_systems(&self) -> MetricResult<Vec<FileSystemInfo>>;

    /// Physical disks.
    async fn disk_layout(&self) -> MetricResult<Vec<DiskLayout>>;

    /// Memory held by the current process.
    async fn process_memory(&self) -> MetricResult<HeapUsage>;
}
