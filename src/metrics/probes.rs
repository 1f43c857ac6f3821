//! Direct sysfs and subprocess probes for sources sysinfo does not cover.
//!
//! Readers are async and suspend on `tokio::fs` / `tokio::process`; the
//! parsing halves are plain functions so they can be tested on any host.

use crate::error::SystemError;
use crate::metrics::data::{BatteryStatus, DiskLayout};
use crate::metrics::traits::MetricResult;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Kernel power supply class directory.
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// First thermal zone, usually the SoC/CPU sensor.
pub const THERMAL_ZONE_TEMP: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Columns requested from lsblk.
const LSBLK_COLUMNS: &str = "NAME,TYPE,SIZE,MODEL,VENDOR,SERIAL,TRAN,ROTA,RM";

/// Raw attribute values of one power supply battery.
#[derive(Debug, Clone, Default)]
pub struct BatteryReadings {
    pub capacity: Option<String>,
    pub status: Option<String>,
    /// µWh
    pub energy_now: Option<u64>,
    /// µW
    pub power_now: Option<u64>,
    pub ac_online: bool,
}

/// Read the first battery under a power supply class directory.
pub async fn read_battery(root: impl AsRef<Path>) -> MetricResult<BatteryStatus> {
    let root = root.as_ref();
    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| SystemError::unavailable(format!("{}: {}", root.display(), e)))?;

    let mut battery_dir: Option<PathBuf> = None;
    let mut ac_online = false;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let kind = read_trimmed(&path.join("type")).await.unwrap_or_default();
        match kind.as_str() {
            "Battery" if battery_dir.is_none() => battery_dir = Some(path),
            "Mains" | "USB" => {
                if read_trimmed(&path.join("online")).await.as_deref() == Some("1") {
                    ac_online = true;
                }
            }
            _ => {}
        }
    }

    let dir = battery_dir.ok_or_else(|| SystemError::unavailable("no battery present"))?;
    let readings = BatteryReadings {
        capacity: read_trimmed(&dir.join("capacity")).await,
        status: read_trimmed(&dir.join("status")).await,
        energy_now: read_u64(&dir.join("energy_now")).await,
        power_now: read_u64(&dir.join("power_now")).await,
        ac_online,
    };

    parse_battery(&readings)
}

/// Turn raw power supply attributes into a battery status.
pub fn parse_battery(readings: &BatteryReadings) -> MetricResult<BatteryStatus> {
    let capacity = readings
        .capacity
        .as_deref()
        .ok_or_else(|| SystemError::unavailable("battery capacity not reported"))?;
    let percent = capacity
        .parse::<u16>()
        .map_err(|e| SystemError::parse_error(format!("battery capacity {:?}: {}", capacity, e)))?
        .min(100) as u8;

    let status = readings.status.as_deref().unwrap_or("Unknown");
    let is_charging = status == "Charging";
    let ac_connected = readings.ac_online || matches!(status, "Charging" | "Full" | "Not charging");

    let time_remaining_minutes = match (is_charging, readings.energy_now, readings.power_now) {
        (false, Some(energy), Some(power)) if power > 0 => Some(energy * 60 / power),
        _ => None,
    };

    Ok(BatteryStatus {
        has_battery: true,
        percent,
        is_charging,
        ac_connected,
        time_remaining_minutes,
    })
}

/// Read a thermal zone temperature file.
pub async fn read_thermal_zone(path: impl AsRef<Path>) -> MetricResult<f32> {
    let raw = tokio::fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| SystemError::unavailable(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_millicelsius(&raw)
}

/// Parse a sysfs millidegree value into Celsius.
pub fn parse_millicelsius(raw: &str) -> MetricResult<f32> {
    let milli = raw
        .trim()
        .parse::<i64>()
        .map_err(|e| SystemError::parse_error(format!("thermal zone value {:?}: {}", raw.trim(), e)))?;
    Ok(milli as f32 / 1000.0)
}

/// List physical disks through `lsblk`.
pub async fn read_disk_layout() -> MetricResult<Vec<DiskLayout>> {
    let output = Command::new("lsblk")
        .args(["--json", "--bytes", "--nodeps", "--output", LSBLK_COLUMNS])
        .output()
        .await
        .map_err(|e| SystemError::unavailable(format!("lsblk: {}", e)))?;

    if !output.status.success() {
        return Err(SystemError::unavailable(format!(
            "lsblk exited with {}",
            output.status
        )));
    }

    parse_lsblk(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `lsblk --json` output, keeping whole disks only.
///
/// Older util-linux releases print every column as a string ("0"/"1" flags,
/// sizes as text); both shapes are accepted.
pub fn parse_lsblk(json: &str) -> MetricResult<Vec<DiskLayout>> {
    let value: Value = serde_json::from_str(json)?;
    let devices = value
        .get("blockdevices")
        .and_then(Value::as_array)
        .ok_or_else(|| SystemError::parse_error("lsblk output has no blockdevices"))?;

    Ok(devices
        .iter()
        .filter(|dev| text(dev, "type") == "disk")
        .map(|dev| DiskLayout {
            device: format!("/dev/{}", text(dev, "name")),
            kind: text(dev, "type"),
            name: text(dev, "model"),
            vendor: text(dev, "vendor"),
            size_bytes: number(dev, "size"),
            serial: text(dev, "serial"),
            interface: text(dev, "tran"),
            removable: flag(dev, "rm"),
            media: if flag(dev, "rota") { "HDD" } else { "SSD" }.to_string(),
        })
        .collect())
}

fn text(dev: &Value, key: &str) -> String {
    match dev.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn number(dev: &Value, key: &str) -> u64 {
    match dev.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn flag(dev: &Value, key: &str) -> bool {
    match dev.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim() == "1",
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .map(|s| s.trim().to_string())
}

async fn read_u64(path: &Path) -> Option<u64> {
    read_trimmed(path).await?.parse().ok()
}
