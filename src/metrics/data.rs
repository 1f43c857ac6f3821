//! Data structures for system metrics.
//!
//! Field names follow the JSON surface dashboards already consume, so the
//! structs serialize with snake_case names and no renaming.

use serde::{Deserialize, Serialize};

/// A complete snapshot of system metrics produced by one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// CPU usage percentage with two decimals
    pub cpu: String,
    /// CPU model name
    pub cpu_name: String,
    /// Memory usage percentage with two decimals
    pub ram: String,
    /// Human readable "used / total" memory text
    pub ram_text: String,
    /// System uptime in seconds
    pub uptime: u64,
    /// Operating system family (e.g. "linux")
    pub platform: String,
    /// CPU architecture (e.g. "aarch64")
    pub architecture: String,
    /// Number of logical CPU cores
    pub cpu_cores: usize,
    /// System hostname
    pub hostname: String,
    /// Load averages (1, 5, 15 minutes)
    pub load_average: [f64; 3],
    /// CPU temperature in Celsius with one decimal, if a sensor is readable
    pub temperature: Option<String>,
    /// Root filesystem usage
    pub disk: Option<DiskStats>,
    /// Network interfaces
    pub network: Vec<NetworkInterface>,
    /// Recent CPU usage samples, oldest first
    pub cpu_history: Vec<CpuSample>,
    /// Recent memory usage samples, oldest first
    pub memory_history: Vec<MemorySample>,
    /// Recent network byte totals, oldest first
    pub network_history: Vec<NetworkSample>,
    /// Memory used by this process
    pub heap: HeapUsage,
    /// Process counts by state
    pub process_count: ProcessCounts,
    /// Mounted filesystems
    pub file_system_info: Vec<FileSystemInfo>,
    /// Smoothed network throughput in bytes per second
    pub network_speed: NetworkSpeed,
    /// Battery status, if the host has one
    pub battery_status: Option<BatteryStatus>,
    /// Wall-clock time of the pass (RFC 3339, UTC)
    pub system_time: String,
    /// Physical disks
    pub disk_layout: Vec<DiskLayout>,
}

/// Static and slow-moving host facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub cpu_name: String,
    pub cpu_cores: usize,
    pub hostname: String,
    pub platform: String,
    pub architecture: String,
    pub uptime_seconds: u64,
    pub load_average: [f64; 3],
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            cpu_name: "unknown".to_string(),
            cpu_cores: 0,
            hostname: "unknown".to_string(),
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            uptime_seconds: 0,
            load_average: [0.0; 3],
        }
    }
}

/// Raw system memory reading in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryReading {
    /// Used memory as a percentage of total, 0 when total is unknown.
    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

/// Usage of the root filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    /// Usage percentage (0.0 to 100.0)
    pub usage_percent: f64,
}

/// Network interface information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Interface name (e.g., "wlan0", "eth0")
    pub iface: String,
    /// MAC address
    pub mac_address: Option<String>,
    /// Whether the interface has seen traffic
    pub is_up: bool,
    /// Bytes received since boot
    pub rx_bytes: u64,
    /// Bytes transmitted since boot
    pub tx_bytes: u64,
}

/// Absolute byte counters of one interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub iface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Resident and virtual memory of this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeapUsage {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

/// Process counts by scheduler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCounts {
    pub all: u64,
    pub running: u64,
    pub blocked: u64,
    pub sleeping: u64,
}

/// One mounted filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSystemInfo {
    /// Device name (e.g., "/dev/mmcblk0p2")
    pub fs: String,
    /// Filesystem type (e.g., "ext4", "vfat")
    pub fs_type: String,
    /// Mount point (e.g., "/", "/boot")
    pub mount: String,
    pub size_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    /// Usage percentage (0.0 to 100.0)
    pub usage_percent: f64,
    pub removable: bool,
}

/// One physical block device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskLayout {
    /// Device node (e.g., "/dev/sda")
    pub device: String,
    /// Device type as reported by the kernel ("disk")
    pub kind: String,
    /// Model name
    pub name: String,
    pub vendor: String,
    pub size_bytes: u64,
    pub serial: String,
    /// Transport (e.g., "sata", "nvme", "usb")
    pub interface: String,
    pub removable: bool,
    /// "HDD" for rotational devices, "SSD" otherwise
    pub media: String,
}

/// Battery state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub has_battery: bool,
    /// Charge level (0 to 100)
    pub percent: u8,
    pub is_charging: bool,
    pub ac_connected: bool,
    /// Minutes until empty, when the firmware reports it
    pub time_remaining_minutes: Option<u64>,
}

/// Smoothed throughput in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpeed {
    pub download: f64,
    pub upload: f64,
}

/// CPU usage at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    pub usage: f32,
}

/// Memory usage at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    pub used: u64,
    pub total: u64,
}

/// Network byte totals at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSample {
    /// Unix timestamp in milliseconds
    pub timestamp: u64,
    pub input: u64,
    pub output: u64,
}
