//! The snapshot aggregator: one concurrent fan-out over every source per pass.

use crate::aggregate::{
    cache::TtlCache,
    config::AggregatorConfig,
    history::HistoryBuffer,
    rate::RateEstimator,
};
use crate::metrics::{
    data::*,
    traits::{MetricResult, MetricsProvider},
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// An aggregator shared between concurrent callers; the lock serializes passes.
pub type SharedAggregator = Arc<tokio::sync::Mutex<Aggregator>>;

const FILE_SYSTEM_KEY: &str = "file_system_info";
const DISK_LAYOUT_KEY: &str = "disk_layout";
const BATTERY_KEY: &str = "battery_status";

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Owns all state that outlives a single pass: the source caches, the rate
/// estimator and the three histories.
pub struct Aggregator {
    provider: Arc<dyn MetricsProvider>,
    config: AggregatorConfig,
    file_systems: TtlCache<MetricResult<Vec<FileSystemInfo>>>,
    disk_layout: TtlCache<MetricResult<Vec<DiskLayout>>>,
    battery: TtlCache<MetricResult<BatteryStatus>>,
    rate: RateEstimator,
    cpu_history: HistoryBuffer<CpuSample>,
    memory_history: HistoryBuffer<MemorySample>,
    network_history: HistoryBuffer<NetworkSample>,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn MetricsProvider>, config: AggregatorConfig) -> Self {
        Self {
            provider,
            config,
            file_systems: TtlCache::new(),
            disk_layout: TtlCache::new(),
            battery: TtlCache::new(),
            rate: RateEstimator::new(),
            cpu_history: HistoryBuffer::new(),
            memory_history: HistoryBuffer::new(),
            network_history: HistoryBuffer::new(),
        }
    }

    /// Aggregator with the default cache lifetimes.
    pub fn with_defaults(provider: Arc<dyn MetricsProvider>) -> Self {
        Self::new(provider, AggregatorConfig::default())
    }

    /// Wrap in a lock so several callers can share one history.
    pub fn into_shared(self) -> SharedAggregator {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Run one aggregation pass.
    ///
    /// Never fails: every source that reports an error is replaced by its
    /// default, so the snapshot always has the same shape.
    pub async fn get_snapshot(&mut self) -> Snapshot {
        let started = tokio::time::Instant::now();
        let provider = &self.provider;
        let fs_ttl = self.config.file_system_ttl;
        let layout_ttl = self.config.disk_layout_ttl;
        let battery_ttl = self.config.battery_ttl;

        let (
            host,
            cpu,
            memory,
            disk,
            network,
            counters,
            temperature,
            process_count,
            heap,
            file_systems,
            disk_layout,
            battery,
        ) = tokio::join!(
            provider.host_info(),
            provider.cpu_usage(),
            provider.memory(),
            provider.disk_usage(),
            provider.network_interfaces(),
            provider.network_counters(),
            provider.temperature(),
            provider.process_counts(),
            provider.process_memory(),
            self.file_systems
                .cached_call(FILE_SYSTEM_KEY, fs_ttl, || provider.file_systems()),
            self.disk_layout
                .cached_call(DISK_LAYOUT_KEY, layout_ttl, || provider.disk_layout()),
            self.battery
                .cached_call(BATTERY_KEY, battery_ttl, || provider.battery()),
        );

        let host = settle("host_info", host).unwrap_or_default();
        let cpu = settle("cpu", cpu)
            .filter(|usage| usage.is_finite())
            .unwrap_or(0.0);
        let memory = settle("memory", memory).unwrap_or_default();
        let temperature = settle("temperature", temperature).filter(|celsius| {
            let usable = celsius.is_finite();
            if !usable {
                debug!(metric = "temperature", "discarding non-finite reading");
            }
            usable
        });

        let totals = settle("network_counters", counters)
            .filter(|counters| !counters.is_empty())
            .map(|counters| sum_counters(&counters));
        let network_speed = match totals {
            Some((rx, tx)) => self.rate.update(rx, tx),
            None => NetworkSpeed::default(),
        };

        let timestamp = unix_millis();
        let (input, output) = totals.unwrap_or_default();
        self.cpu_history.append(CpuSample {
            timestamp,
            usage: cpu,
        });
        self.memory_history.append(MemorySample {
            timestamp,
            used: memory.used_bytes,
            total: memory.total_bytes,
        });
        self.network_history.append(NetworkSample {
            timestamp,
            input,
            output,
        });

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation pass complete"
        );

        Snapshot {
            cpu: format!("{:.2}", cpu),
            cpu_name: host.cpu_name,
            ram: format!("{:.2}", memory.usage_percent()),
            ram_text: ram_text(&memory),
            uptime: host.uptime_seconds,
            platform: host.platform,
            architecture: host.architecture,
            cpu_cores: host.cpu_cores,
            hostname: host.hostname,
            load_average: host.load_average,
            temperature: temperature.map(|celsius| format!("{:.1}", celsius)),
            disk: settle("disk", disk),
            network: settle("network", network).unwrap_or_default(),
            cpu_history: self.cpu_history.snapshot_view(),
            memory_history: self.memory_history.snapshot_view(),
            network_history: self.network_history.snapshot_view(),
            heap: settle("heap", heap).unwrap_or_default(),
            process_count: settle("process_count", process_count).unwrap_or_default(),
            file_system_info: settle("file_system_info", file_systems).unwrap_or_default(),
            network_speed,
            battery_status: settle("battery_status", battery),
            system_time: chrono::Utc::now().to_rfc3339(),
            disk_layout: settle("disk_layout", disk_layout).unwrap_or_default(),
        }
    }
}

/// Map a failed source to `None`, logging why.
fn settle<T>(metric: &'static str, result: MetricResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(metric, error = %err, "source degraded, using default");
            None
        }
    }
}

fn sum_counters(counters: &[InterfaceCounters]) -> (u64, u64) {
    counters.iter().fold((0u64, 0u64), |(rx, tx), c| {
        (rx.saturating_add(c.rx_bytes), tx.saturating_add(c.tx_bytes))
    })
}

fn ram_text(memory: &MemoryReading) -> String {
    format!(
        "{:.2} GB / {:.2} GB",
        memory.used_bytes as f64 / GIB,
        memory.total_bytes as f64 / GIB
    )
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
