use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysdash::{
    aggregate::HISTORY_CAPACITY,
    create_app,
    error::SystemError,
    metrics::data::*,
    Aggregator, AggregatorConfig, MetricResult, MetricsProvider, WebConfig,
};
use tower::ServiceExt;

const GIB: u64 = 1024 * 1024 * 1024;

/// Provider double whose sources succeed or fail on demand.
struct ScriptedProvider {
    failing: Mutex<HashSet<&'static str>>,
    counters: Mutex<Vec<InterfaceCounters>>,
    temperature: Mutex<f32>,
    cpu: Mutex<f32>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl ScriptedProvider {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            failing: Mutex::new(HashSet::new()),
            counters: Mutex::new(vec![counters("eth0", 0, 0)]),
            temperature: Mutex::new(47.3),
            cpu: Mutex::new(12.5),
            calls: Mutex::new(HashMap::new()),
        })
    }

    fn failing_everything() -> Arc<Self> {
        let provider = Self::healthy();
        for source in [
            "host_info",
            "cpu_usage",
            "memory",
            "disk_usage",
            "network_interfaces",
            "network_counters",
            "temperature",
            "battery",
            "process_counts",
            "file_systems",
            "disk_layout",
            "process_memory",
        ] {
            provider.fail(source);
        }
        provider
    }

    fn fail(&self, source: &'static str) {
        self.failing.lock().unwrap().insert(source);
    }

    fn recover(&self, source: &'static str) {
        self.failing.lock().unwrap().remove(source);
    }

    fn set_counters(&self, list: Vec<InterfaceCounters>) {
        *self.counters.lock().unwrap() = list;
    }

    fn set_temperature(&self, celsius: f32) {
        *self.temperature.lock().unwrap() = celsius;
    }

    fn set_cpu(&self, usage: f32) {
        *self.cpu.lock().unwrap() = usage;
    }

    fn calls(&self, source: &'static str) -> usize {
        self.calls.lock().unwrap().get(source).copied().unwrap_or(0)
    }

    fn answer<T>(&self, source: &'static str, value: T) -> MetricResult<T> {
        *self.calls.lock().unwrap().entry(source).or_insert(0) += 1;
        if self.failing.lock().unwrap().contains(source) {
            Err(SystemError::unavailable(format!("{} scripted to fail", source)))
        } else {
            Ok(value)
        }
    }
}

fn counters(iface: &str, rx_bytes: u64, tx_bytes: u64) -> InterfaceCounters {
    InterfaceCounters {
        iface: iface.to_string(),
        rx_bytes,
        tx_bytes,
    }
}

#[async_trait::async_trait]
impl MetricsProvider for ScriptedProvider {
    async fn host_info(&self) -> MetricResult<HostInfo> {
        self.answer(
            "host_info",
            HostInfo {
                cpu_name: "Cortex-A76".to_string(),
                cpu_cores: 4,
                hostname: "test-host".to_string(),
                platform: "linux".to_string(),
                architecture: "aarch64".to_string(),
                uptime_seconds: 86400,
                load_average: [1.5, 1.2, 1.0],
            },
        )
    }

    async fn cpu_usage(&self) -> MetricResult<f32> {
        let usage = *self.cpu.lock().unwrap();
        self.answer("cpu_usage", usage)
    }

    async fn memory(&self) -> MetricResult<MemoryReading> {
        self.answer(
            "memory",
            MemoryReading {
                total_bytes: 16 * GIB,
                used_bytes: 4 * GIB,
                available_bytes: 12 * GIB,
            },
        )
    }

    async fn disk_usage(&self) -> MetricResult<DiskStats> {
        self.answer(
            "disk_usage",
            DiskStats {
                mount_point: "/".to_string(),
                total_bytes: 500 * GIB,
                used_bytes: 250 * GIB,
                free_bytes: 250 * GIB,
                usage_percent: 50.0,
            },
        )
    }

    async fn network_interfaces(&self) -> MetricResult<Vec<NetworkInterface>> {
        self.answer(
            "network_interfaces",
            vec![NetworkInterface {
                iface: "eth0".to_string(),
                mac_address: Some("00:11:22:33:44:55".to_string()),
                is_up: true,
                rx_bytes: 2_000_000,
                tx_bytes: 1_000_000,
            }],
        )
    }

    async fn network_counters(&self) -> MetricResult<Vec<InterfaceCounters>> {
        let list = self.counters.lock().unwrap().clone();
        self.answer("network_counters", list)
    }

    async fn temperature(&self) -> MetricResult<f32> {
        let celsius = *self.temperature.lock().unwrap();
        self.answer("temperature", celsius)
    }

    async fn battery(&self) -> MetricResult<BatteryStatus> {
        self.answer(
            "battery",
            BatteryStatus {
                has_battery: true,
                percent: 87,
                is_charging: false,
                ac_connected: false,
                time_remaining_minutes: Some(240),
            },
        )
    }

    async fn process_counts(&self) -> MetricResult<ProcessCounts> {
        self.answer(
            "process_counts",
            ProcessCounts {
                all: 150,
                running: 3,
                blocked: 1,
                sleeping: 140,
            },
        )
    }

    async fn file_systems(&self) -> MetricResult<Vec<FileSystemInfo>> {
        self.answer(
            "file_systems",
            vec![FileSystemInfo {
                fs: "/dev/sda1".to_string(),
                fs_type: "ext4".to_string(),
                mount: "/".to_string(),
                size_bytes: 500 * GIB,
                used_bytes: 250 * GIB,
                available_bytes: 250 * GIB,
                usage_percent: 50.0,
                removable: false,
            }],
        )
    }

    async fn disk_layout(&self) -> MetricResult<Vec<DiskLayout>> {
        self.answer(
            "disk_layout",
            vec![DiskLayout {
                device: "/dev/sda".to_string(),
                kind: "disk".to_string(),
                name: "WDC WD5000".to_string(),
                vendor: "ATA".to_string(),
                size_bytes: 500 * GIB,
                serial: "WD-1".to_string(),
                interface: "sata".to_string(),
                removable: false,
                media: "HDD".to_string(),
            }],
        )
    }

    async fn process_memory(&self) -> MetricResult<HeapUsage> {
        self.answer(
            "process_memory",
            HeapUsage {
                resident_bytes: 12 * 1024 * 1024,
                virtual_bytes: 256 * 1024 * 1024,
            },
        )
    }
}

/// Test a pass over healthy sources
#[tokio::test]
async fn test_healthy_snapshot() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    let snapshot = aggregator.get_snapshot().await;

    assert_eq!(snapshot.cpu, "12.50");
    assert_eq!(snapshot.cpu_name, "Cortex-A76");
    assert_eq!(snapshot.ram, "25.00");
    assert_eq!(snapshot.ram_text, "4.00 GB / 16.00 GB");
    assert_eq!(snapshot.uptime, 86400);
    assert_eq!(snapshot.cpu_cores, 4);
    assert_eq!(snapshot.hostname, "test-host");
    assert_eq!(snapshot.load_average, [1.5, 1.2, 1.0]);
    assert_eq!(snapshot.temperature.as_deref(), Some("47.3"));
    assert_eq!(snapshot.disk.as_ref().map(|d| d.usage_percent), Some(50.0));
    assert_eq!(snapshot.network.len(), 1);
    assert_eq!(snapshot.process_count.all, 150);
    assert_eq!(snapshot.file_system_info.len(), 1);
    assert_eq!(snapshot.disk_layout.len(), 1);
    assert_eq!(snapshot.battery_status.as_ref().map(|b| b.percent), Some(87));
    assert_eq!(snapshot.heap.resident_bytes, 12 * 1024 * 1024);
    assert_eq!(snapshot.network_speed, NetworkSpeed::default());
    assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.system_time).is_ok());
}

/// Test that every failed source is replaced by its documented default
#[tokio::test]
async fn test_total_failure_yields_defaults() {
    let provider = ScriptedProvider::failing_everything();
    let mut aggregator = Aggregator::with_defaults(provider);

    let snapshot = aggregator.get_snapshot().await;

    assert_eq!(snapshot.cpu, "0.00");
    assert_eq!(snapshot.ram, "0.00");
    assert_eq!(snapshot.cpu_name, "unknown");
    assert_eq!(snapshot.hostname, "unknown");
    assert_eq!(snapshot.disk, None);
    assert!(snapshot.network.is_empty());
    assert_eq!(snapshot.temperature, None);
    assert_eq!(snapshot.battery_status, None);
    assert_eq!(snapshot.process_count, ProcessCounts::default());
    assert!(snapshot.file_system_info.is_empty());
    assert!(snapshot.disk_layout.is_empty());
    assert_eq!(
        snapshot.network_speed,
        NetworkSpeed {
            download: 0.0,
            upload: 0.0
        }
    );
    assert_eq!(snapshot.heap, HeapUsage::default());

    // History still advances with the defaulted values.
    assert_eq!(snapshot.cpu_history.len(), 1);
    assert_eq!(snapshot.memory_history.len(), 1);
    assert_eq!(snapshot.network_history.len(), 1);
    assert_eq!(snapshot.cpu_history[0].usage, 0.0);
}

/// Test that one failing source leaves the others untouched
#[tokio::test]
async fn test_single_failure_is_isolated() {
    let provider = ScriptedProvider::healthy();
    provider.fail("battery");
    provider.fail("network_interfaces");
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    let snapshot = aggregator.get_snapshot().await;

    assert_eq!(snapshot.battery_status, None);
    assert!(snapshot.network.is_empty());
    assert_eq!(snapshot.cpu, "12.50");
    assert!(snapshot.disk.is_some());
    assert_eq!(snapshot.file_system_info.len(), 1);
}

/// Test that non-finite temperatures are treated as unavailable
#[tokio::test]
async fn test_nan_temperature_is_dropped() {
    let provider = ScriptedProvider::healthy();
    provider.set_temperature(f32::NAN);
    let mut aggregator = Aggregator::with_defaults(provider);

    assert_eq!(aggregator.get_snapshot().await.temperature, None);
}

/// Test that a non-finite CPU reading falls back to zero in output and history
#[tokio::test]
async fn test_nan_cpu_usage_reports_zero() {
    let provider = ScriptedProvider::healthy();
    provider.set_cpu(f32::NAN);
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    let snapshot = aggregator.get_snapshot().await;
    assert_eq!(snapshot.cpu, "0.00");
    assert_eq!(snapshot.cpu_history[0].usage, 0.0);

    provider.set_cpu(f32::INFINITY);
    assert_eq!(aggregator.get_snapshot().await.cpu, "0.00");
}

/// Test that cached sources are queried once per TTL window
#[tokio::test(start_paused = true)]
async fn test_cached_sources_respect_ttl() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    aggregator.get_snapshot().await;
    tokio::time::advance(Duration::from_secs(5)).await;
    aggregator.get_snapshot().await;

    assert_eq!(provider.calls("cpu_usage"), 2);
    assert_eq!(provider.calls("file_systems"), 1);
    assert_eq!(provider.calls("battery"), 1);
    assert_eq!(provider.calls("disk_layout"), 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    aggregator.get_snapshot().await;

    assert_eq!(provider.calls("file_systems"), 2);
    assert_eq!(provider.calls("battery"), 2);
    assert_eq!(provider.calls("disk_layout"), 1);

    tokio::time::advance(Duration::from_secs(20)).await;
    aggregator.get_snapshot().await;
    assert_eq!(provider.calls("disk_layout"), 2);
}

/// Test that a cached failure is served until it expires
#[tokio::test(start_paused = true)]
async fn test_cached_failure_is_not_masked() {
    let provider = ScriptedProvider::healthy();
    provider.fail("battery");
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    assert_eq!(aggregator.get_snapshot().await.battery_status, None);
    provider.recover("battery");
    assert_eq!(aggregator.get_snapshot().await.battery_status, None);
    assert_eq!(provider.calls("battery"), 1);

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(aggregator.get_snapshot().await.battery_status.is_some());
}

/// Test that disabled caches hit the provider on every pass
#[tokio::test]
async fn test_uncached_config() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::new(provider.clone(), AggregatorConfig::uncached());

    aggregator.get_snapshot().await;
    aggregator.get_snapshot().await;

    assert_eq!(provider.calls("file_systems"), 2);
    assert_eq!(provider.calls("disk_layout"), 2);
    assert_eq!(provider.calls("battery"), 2);
}

/// Test throughput across passes one second apart
#[tokio::test(start_paused = true)]
async fn test_network_speed_across_passes() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    provider.set_counters(vec![counters("eth0", 600, 200), counters("wlan0", 400, 300)]);
    let first = aggregator.get_snapshot().await;
    assert_eq!(first.network_speed, NetworkSpeed::default());

    tokio::time::advance(Duration::from_secs(1)).await;
    provider.set_counters(vec![counters("eth0", 2000, 1000), counters("wlan0", 1000, 500)]);
    let second = aggregator.get_snapshot().await;
    assert_eq!(
        second.network_speed,
        NetworkSpeed {
            download: 2000.0,
            upload: 1000.0
        }
    );

    let latest = second.network_history.last().unwrap();
    assert_eq!((latest.input, latest.output), (3000, 1500));
}

/// Test that a failed or empty counter source leaves the estimator untouched
#[tokio::test(start_paused = true)]
async fn test_counter_failure_keeps_estimator_state() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::with_defaults(provider.clone());

    provider.set_counters(vec![counters("eth0", 1000, 500)]);
    aggregator.get_snapshot().await;

    tokio::time::advance(Duration::from_secs(1)).await;
    provider.fail("network_counters");
    let failed = aggregator.get_snapshot().await;
    assert_eq!(failed.network_speed, NetworkSpeed::default());

    tokio::time::advance(Duration::from_secs(1)).await;
    provider.recover("network_counters");
    provider.set_counters(Vec::new());
    let empty = aggregator.get_snapshot().await;
    assert_eq!(empty.network_speed, NetworkSpeed::default());

    // Baseline is still the first pass, two seconds ago.
    provider.set_counters(vec![counters("eth0", 3000, 1500)]);
    let recovered = aggregator.get_snapshot().await;
    assert_eq!(
        recovered.network_speed,
        NetworkSpeed {
            download: 1000.0,
            upload: 500.0
        }
    );
}

/// Test that histories grow to capacity and then slide
#[tokio::test]
async fn test_histories_are_bounded() {
    let provider = ScriptedProvider::healthy();
    let mut aggregator = Aggregator::with_defaults(provider);

    let mut snapshot = aggregator.get_snapshot().await;
    for _ in 1..HISTORY_CAPACITY + 5 {
        snapshot = aggregator.get_snapshot().await;
    }

    assert_eq!(snapshot.cpu_history.len(), HISTORY_CAPACITY);
    assert_eq!(snapshot.memory_history.len(), HISTORY_CAPACITY);
    assert_eq!(snapshot.network_history.len(), HISTORY_CAPACITY);

    for window in snapshot.cpu_history.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }
    for i in 0..HISTORY_CAPACITY {
        assert_eq!(snapshot.cpu_history[i].timestamp, snapshot.memory_history[i].timestamp);
        assert_eq!(snapshot.cpu_history[i].timestamp, snapshot.network_history[i].timestamp);
    }
    assert_eq!(snapshot.memory_history[0].total, 16 * GIB);
}

/// Test that independent aggregators do not share state
#[tokio::test]
async fn test_aggregators_are_independent() {
    let provider = ScriptedProvider::healthy();
    let mut first = Aggregator::with_defaults(provider.clone());
    let mut second = Aggregator::with_defaults(provider);

    first.get_snapshot().await;
    first.get_snapshot().await;
    let snapshot = second.get_snapshot().await;

    assert_eq!(snapshot.cpu_history.len(), 1);
}

/// Test concurrent callers through the shared handle
#[tokio::test]
async fn test_shared_aggregator_serializes_passes() {
    let shared = Aggregator::with_defaults(ScriptedProvider::healthy()).into_shared();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            tokio::spawn(async move { shared.lock().await.get_snapshot().await })
        })
        .collect();

    let mut lengths = Vec::new();
    for handle in handles {
        lengths.push(handle.await.unwrap().cpu_history.len());
    }
    lengths.sort();
    assert_eq!(lengths, vec![1, 2, 3, 4]);
}

/// Test the JSON field surface of a snapshot
#[tokio::test]
async fn test_snapshot_json_fields() {
    let mut aggregator = Aggregator::with_defaults(ScriptedProvider::failing_everything());
    let snapshot = aggregator.get_snapshot().await;
    let json_value = serde_json::to_value(&snapshot).expect("Should serialize");

    for field in [
        "cpu",
        "cpu_name",
        "ram",
        "ram_text",
        "uptime",
        "platform",
        "architecture",
        "cpu_cores",
        "hostname",
        "load_average",
        "temperature",
        "disk",
        "network",
        "cpu_history",
        "memory_history",
        "network_history",
        "heap",
        "process_count",
        "file_system_info",
        "network_speed",
        "battery_status",
        "system_time",
        "disk_layout",
    ] {
        assert!(json_value.get(field).is_some(), "missing field {}", field);
    }

    assert!(json_value["battery_status"].is_null());
    assert!(json_value["disk"].is_null());
    assert!(json_value["temperature"].is_null());
    assert_eq!(json_value["network"], serde_json::json!([]));
    assert_eq!(json_value["load_average"].as_array().map(Vec::len), Some(3));
}

/// Test the snapshot endpoint
#[tokio::test]
async fn test_snapshot_endpoint() {
    let shared = Aggregator::with_defaults(ScriptedProvider::healthy()).into_shared();
    let app = create_app(&WebConfig::default(), shared);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/snapshot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let snapshot: Snapshot = serde_json::from_slice(&body).expect("Should deserialize");
    assert_eq!(snapshot.hostname, "test-host");
    assert_eq!(snapshot.cpu_history.len(), 1);
}

/// Test the health endpoint
#[tokio::test]
async fn test_health_endpoint() {
    let shared = Aggregator::with_defaults(ScriptedProvider::healthy()).into_shared();
    let app = create_app(&WebConfig::default().with_cors(false), shared);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "sysdash");
}

/// Test that the served aggregator uses the configured TTLs
#[tokio::test(start_paused = true)]
async fn test_web_config_builds_aggregator() {
    let provider = ScriptedProvider::healthy();
    let config = WebConfig::new("127.0.0.1", 9090)
        .with_cors(false)
        .with_aggregator(AggregatorConfig::uncached());
    assert_eq!(config.socket_addr().unwrap().port(), 9090);

    let shared = config.build_aggregator(provider.clone());
    shared.lock().await.get_snapshot().await;
    shared.lock().await.get_snapshot().await;

    assert_eq!(provider.calls("battery"), 2);
    assert_eq!(provider.calls("file_systems"), 2);
}

/// Test SystemError creation and formatting
#[test]
fn test_system_error_types() {
    let unavailable = SystemError::unavailable("no battery present");
    assert!(format!("{}", unavailable).contains("no battery present"));

    let malformed = SystemError::malformed("temperature NaN");
    assert!(format!("{}", malformed).contains("temperature NaN"));

    let parse_error = SystemError::parse_error("Failed to parse data");
    assert!(format!("{}", parse_error).contains("Failed to parse data"));

    let web_error = SystemError::web_server_error("Server startup failed");
    assert!(format!("{}", web_error).contains("Server startup failed"));

    let config_error = SystemError::config_error("Invalid configuration");
    assert!(format!("{}", config_error).contains("Invalid configuration"));
}
