use std::fs;
use std::path::{Path, PathBuf};

use sysinfo::{Disks, System};

use super::{DiskUsage, MemoryUsage, MetricSource};
use crate::{Error, Result};

const THERMAL_ROOT: &str = "/sys/class/thermal";
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// 1-minute load average.
pub struct LoadAverage;

impl MetricSource for LoadAverage {
    type Output = f64;

    fn sample(&mut self) -> Result<f64> {
        let one = System::load_average().one;
        if one.is_finite() {
            Ok(one)
        } else {
            Err(Error::Metric(format!("load average is not a number: {one}")))
        }
    }
}

/// First readable `thermal_zone*/temp` under a sysfs root, in degrees Celsius.
pub struct ThermalZone {
    root: PathBuf,
}

impl Default for ThermalZone {
    fn default() -> Self {
        Self::with_root(THERMAL_ROOT)
    }
}

impl ThermalZone {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn zones(&self) -> Result<Vec<PathBuf>> {
        let mut zones: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("thermal_zone"))
            .map(|entry| entry.path().join("temp"))
            .collect();
        zones.sort();
        Ok(zones)
    }
}

impl MetricSource for ThermalZone {
    type Output = f64;

    fn sample(&mut self) -> Result<f64> {
        self.zones()?
            .iter()
            .find_map(|path| read_millidegrees(path))
            .map(|milli| milli as f64 / 1000.0)
            .ok_or_else(|| {
                Error::Metric(format!(
                    "no readable thermal zone under {}",
                    self.root.display()
                ))
            })
    }
}

fn read_millidegrees(path: &Path) -> Option<i64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Used (total minus available) and total RAM.
pub struct SystemMemory {
    sys: System,
}

impl SystemMemory {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SystemMemory {
    type Output = MemoryUsage;

    fn sample(&mut self) -> Result<MemoryUsage> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(Error::Metric("total memory reported as zero".into()));
        }
        let used = self.sys.used_memory();
        Ok(MemoryUsage {
            used_gib: used as f64 / GIB,
            total_gib: total as f64 / GIB,
            percent: used as f64 / total as f64 * 100.0,
        })
    }
}

/// Usage of the filesystem mounted at `/`.
pub struct RootDisk {
    mount_point: PathBuf,
}

impl Default for RootDisk {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::from("/"),
        }
    }
}

impl MetricSource for RootDisk {
    type Output = DiskUsage;

    fn sample(&mut self) -> Result<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == self.mount_point)
            .ok_or_else(|| {
                Error::Metric(format!(
                    "no filesystem mounted at {}",
                    self.mount_point.display()
                ))
            })?;
        Ok(disk_usage(disk.total_space(), disk.available_space()))
    }
}

/// Build the display figures the way `df -h` reports them.
pub fn disk_usage(total: u64, available: u64) -> DiskUsage {
    let used = total.saturating_sub(available);
    let percent = if total == 0 {
        0.0
    } else {
        (used as f64 / (used + available) as f64 * 100.0).ceil()
    };
    DiskUsage {
        used: strip_gib_suffix(&human_size(used)),
        total: strip_gib_suffix(&human_size(total)),
        percent,
    }
}

/// `df -h` sizing: 1024 base, one rounded-up decimal below 10, whole units above.
/// Rounding up to 1024 carries into the next unit.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return bytes.to_string();
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let mut shown = round_up(value);
    if shown >= 1024.0 && unit < UNITS.len() - 1 {
        shown = round_up(shown / 1024.0);
        unit += 1;
    }
    if shown < 10.0 {
        format!("{shown:.1}{}", UNITS[unit])
    } else {
        format!("{shown:.0}{}", UNITS[unit])
    }
}

fn round_up(value: f64) -> f64 {
    let tenths = (value * 10.0).ceil() / 10.0;
    if tenths < 10.0 {
        tenths
    } else {
        value.ceil()
    }
}

fn strip_gib_suffix(size: &str) -> String {
    size.trim_end_matches('G').to_string()
}
