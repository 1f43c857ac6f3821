//! Host metrics collection backed by sysinfo and direct /sys access.

use crate::error::SystemError;
use crate::metrics::{
    data::*,
    probes,
    traits::{MetricResult, MetricsProvider},
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use sysinfo::{
    Components, Disks, Networks, Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate,
    System,
};

/// Component labels that identify the CPU package sensor.
const CPU_SENSOR_LABELS: [&str; 5] = ["package", "tctl", "cpu", "coretemp", "k10temp"];

/// Production [`MetricsProvider`] reading the local host.
///
/// sysinfo handles are refreshed in place so CPU usage is measured between
/// consecutive calls. Locks are never held across an `.await`.
pub struct SysinfoProvider {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    components: Mutex<Components>,
}

impl SysinfoProvider {
    /// Create a new provider and take the first CPU measurement.
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            components: Mutex::new(Components::new_with_refreshed_list()),
        }
    }

    fn disks_refreshed(&self) -> MetricResult<MutexGuard<'_, Disks>> {
        let mut disks = lock(&self.disks, "disks")?;
        disks.refresh_list();
        Ok(disks)
    }

    fn networks_refreshed(&self) -> MetricResult<MutexGuard<'_, Networks>> {
        let mut networks = lock(&self.networks, "networks")?;
        networks.refresh_list();
        Ok(networks)
    }

    fn processes_refreshed(
        &self,
        which: ProcessesToUpdate<'_>,
    ) -> MetricResult<MutexGuard<'_, System>> {
        let mut system = lock(&self.system, "system")?;
        system.refresh_processes_specifics(which, ProcessRefreshKind::new().with_memory());
        Ok(system)
    }

    /// Read the CPU package temperature from sysinfo components.
    fn component_temperature(&self) -> MetricResult<Option<f32>> {
        let mut components = lock(&self.components, "components")?;
        components.refresh();

        Ok(cpu_temperature(
            components.iter().map(|c| (c.label(), c.temperature())),
        ))
    }
}

/// First finite reading from a sensor labelled as the CPU.
///
/// Other sensors (NVMe, wifi, ...) are never reported as the CPU temperature.
fn cpu_temperature<'a>(readings: impl IntoIterator<Item = (&'a str, f32)>) -> Option<f32> {
    readings
        .into_iter()
        .filter(|(label, _)| {
            let label = label.to_lowercase();
            CPU_SENSOR_LABELS.iter().any(|known| label.contains(known))
        })
        .map(|(_, celsius)| celsius)
        .find(|celsius| celsius.is_finite())
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MetricResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| SystemError::unavailable(format!("{} handle poisoned", what)))
}

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

#[async_trait]
impl MetricsProvider for SysinfoProvider {
    async fn host_info(&self) -> MetricResult<HostInfo> {
        let system = lock(&self.system, "system")?;
        let cpus = system.cpus();
        let load = System::load_average();

        Ok(HostInfo {
            cpu_name: cpus
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            cpu_cores: cpus.len(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            uptime_seconds: System::uptime(),
            load_average: [load.one, load.five, load.fifteen],
        })
    }

    async fn cpu_usage(&self) -> MetricResult<f32> {
        let mut system = lock(&self.system, "system")?;
        system.refresh_cpu_usage();

        let cpus = system.cpus();
        if cpus.is_empty() {
            return Err(SystemError::unavailable("No CPU information available"));
        }

        let usage = cpus.iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / cpus.len() as f32;
        if usage.is_finite() {
            Ok(usage)
        } else {
            Err(SystemError::malformed(format!("cpu usage {}", usage)))
        }
    }

    async fn memory(&self) -> MetricResult<MemoryReading> {
        let mut system = lock(&self.system, "system")?;
        system.refresh_memory();

        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return Err(SystemError::unavailable("memory totals not reported"));
        }

        Ok(MemoryReading {
            total_bytes,
            used_bytes: system.used_memory(),
            available_bytes: system.available_memory(),
        })
    }

    async fn disk_usage(&self) -> MetricResult<DiskStats> {
        let disks = self.disks_refreshed()?;
        let disk = disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| disks.iter().next())
            .ok_or_else(|| SystemError::unavailable("no mounted disks"))?;

        let total_bytes = disk.total_space();
        let free_bytes = disk.available_space();
        let used_bytes = total_bytes.saturating_sub(free_bytes);

        Ok(DiskStats {
            mount_point: disk.mount_point().to_string_lossy().to_string(),
            total_bytes,
            used_bytes,
            free_bytes,
            usage_percent: percent(used_bytes, total_bytes),
        })
    }

    async fn network_interfaces(&self) -> MetricResult<Vec<NetworkInterface>> {
        let networks = self.networks_refreshed()?;

        let mut interfaces: Vec<NetworkInterface> = networks
            .iter()
            .map(|(name, data)| NetworkInterface {
                iface: name.clone(),
                mac_address: Some(data.mac_address().to_string())
                    .filter(|mac| mac != "00:00:00:00:00:00"),
                is_up: data.total_transmitted() > 0 || data.total_received() > 0,
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.iface.cmp(&b.iface));

        Ok(interfaces)
    }

    async fn network_counters(&self) -> MetricResult<Vec<InterfaceCounters>> {
        let networks = self.networks_refreshed()?;

        Ok(networks
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .map(|(name, data)| InterfaceCounters {
                iface: name.clone(),
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
            })
            .collect())
    }

    async fn temperature(&self) -> MetricResult<f32> {
        let celsius = match self.component_temperature()? {
            Some(celsius) => celsius,
            None => probes::read_thermal_zone(probes::THERMAL_ZONE_TEMP).await?,
        };

        if celsius.is_finite() {
            Ok(celsius)
        } else {
            Err(SystemError::malformed(format!("temperature {}", celsius)))
        }
    }

    async fn battery(&self) -> MetricResult<BatteryStatus> {
        if cfg!(target_os = "linux") {
            probes::read_battery(probes::POWER_SUPPLY_ROOT).await
        } else {
            Err(SystemError::unavailable(format!(
                "battery status not supported on {}",
                std::env::consts::OS
            )))
        }
    }

    async fn process_counts(&self) -> MetricResult<ProcessCounts> {
        let system = self.processes_refreshed(ProcessesToUpdate::All)?;

        let mut counts = ProcessCounts::default();
        for process in system.processes().values() {
            counts.all += 1;
            match process.status() {
                ProcessStatus::Run => counts.running += 1,
                ProcessStatus::Sleep | ProcessStatus::Idle => counts.sleeping += 1,
                ProcessStatus::UninterruptibleDiskSleep => counts.blocked += 1,
                _ => {}
            }
        }

        Ok(counts)
    }

    async fn file_systems(&self) -> MetricResult<Vec<FileSystemInfo>> {
        let disks = self.disks_refreshed()?;

        Ok(disks
            .iter()
            .map(|disk| {
                let size_bytes = disk.total_space();
                let available_bytes = disk.available_space();
                let used_bytes = size_bytes.saturating_sub(available_bytes);

                FileSystemInfo {
                    fs: disk.name().to_string_lossy().to_string(),
                    fs_type: disk.file_system().to_string_lossy().to_string(),
                    mount: disk.mount_point().to_string_lossy().to_string(),
                    size_bytes,
                    used_bytes,
                    available_bytes,
                    usage_percent: percent(used_bytes, size_bytes),
                    removable: disk.is_removable(),
                }
            })
            .collect())
    }

    async fn disk_layout(&self) -> MetricResult<Vec<DiskLayout>> {
        if cfg!(target_os = "linux") {
            probes::read_disk_layout().await
        } else {
            Err(SystemError::unavailable(format!(
                "disk layout not supported on {}",
                std::env::consts::OS
            )))
        }
    }

    async fn process_memory(&self) -> MetricResult<HeapUsage> {
        let pid: Pid = sysinfo::get_current_pid().map_err(SystemError::unavailable)?;
        let system = self.processes_refreshed(ProcessesToUpdate::Some(&[pid]))?;
        let process = system
            .process(pid)
            .ok_or_else(|| SystemError::unavailable("current process not listed"))?;

        Ok(HeapUsage {
            resident_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
        })
    }
}
