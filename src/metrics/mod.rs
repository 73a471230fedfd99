//! Metric sources sampled once per tick.
//!
//! Every source fails on its own: the collector swaps a failed sample for the
//! type's zero value so one missing reading never blanks the other lines.

use crate::{app::Logger, Result};

pub mod fake;
pub mod network;
pub mod system;

pub use network::{FactKind, NetworkFact};

/// A single system reading that either yields a typed value or fails.
pub trait MetricSource {
    type Output;

    fn sample(&mut self) -> Result<Self::Output>;
}

pub type BoxedSource<T> = Box<dyn MetricSource<Output = T>>;

/// Memory in GiB plus percent used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoryUsage {
    pub used_gib: f64,
    pub total_gib: f64,
    pub percent: f64,
}

/// Root filesystem usage; sizes are `df -h` style strings without the `G` suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub used: String,
    pub total: String,
    pub percent: f64,
}

impl Default for DiskUsage {
    fn default() -> Self {
        Self {
            used: "0".into(),
            total: "0".into(),
            percent: 0.0,
        }
    }
}

/// Everything one tick renders. Rebuilt from scratch every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub load: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
    /// Hostname first, then interfaces in enumeration order.
    pub facts: Vec<NetworkFact>,
}

pub struct Sources {
    pub load: BoxedSource<f64>,
    pub temperature: BoxedSource<f64>,
    pub memory: BoxedSource<MemoryUsage>,
    pub disk: BoxedSource<DiskUsage>,
    pub network: BoxedSource<Vec<NetworkFact>>,
}

impl Sources {
    /// Sources backed by the running kernel.
    pub fn system() -> Self {
        Self {
            load: Box::new(system::LoadAverage),
            temperature: Box::new(system::ThermalZone::default()),
            memory: Box::new(system::SystemMemory::new()),
            disk: Box::new(system::RootDisk::default()),
            network: Box::new(network::InterfaceScan),
        }
    }

    /// Sample every source in turn; failures degrade to zero values.
    pub fn collect(&mut self, hostname: &str, logger: &Logger) -> Snapshot {
        let mut facts = vec![NetworkFact::hostname(hostname)];
        facts.extend(sample_or_default("network", self.network.as_mut(), logger));

        Snapshot {
            load: sample_or_default("load", self.load.as_mut(), logger),
            temperature: sample_or_default("temperature", self.temperature.as_mut(), logger),
            memory: sample_or_default("memory", self.memory.as_mut(), logger),
            disk: sample_or_default("disk", self.disk.as_mut(), logger),
            facts,
        }
    }
}

fn sample_or_default<T: Default>(
    name: &str,
    source: &mut dyn MetricSource<Output = T>,
    logger: &Logger,
) -> T {
    source.sample().unwrap_or_else(|err| {
        logger.debug(format!("{name} sample failed: {err}"));
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::fake::{FailingSource, FixedSource};
    use super::*;
    use crate::app::LogLevel;

    fn sources() -> Sources {
        Sources {
            load: Box::new(FixedSource(0.42)),
            temperature: Box::new(FixedSource(45.0)),
            memory: Box::new(FixedSource(MemoryUsage {
                used_gib: 1.2,
                total_gib: 4.0,
                percent: 30.0,
            })),
            disk: Box::new(FixedSource(DiskUsage {
                used: "5".into(),
                total: "32".into(),
                percent: 16.0,
            })),
            network: Box::new(FixedSource(vec![NetworkFact::new(
                FactKind::Lan,
                "192.168.1.20",
            )])),
        }
    }

    #[test]
    fn hostname_leads_the_fact_list() {
        let logger = Logger::new(LogLevel::Error, None);
        let snap = sources().collect("pi-test", &logger);
        assert_eq!(snap.facts[0], NetworkFact::hostname("pi-test"));
        assert_eq!(snap.facts[1].kind, FactKind::Lan);
        assert_eq!(snap.load, 0.42);
    }

    #[test]
    fn failed_sources_degrade_independently() {
        let logger = Logger::new(LogLevel::Error, None);
        let mut sources = sources();
        sources.temperature = Box::new(FailingSource::new("no thermal zone"));
        sources.network = Box::new(FailingSource::new("getifaddrs failed"));
        let snap = sources.collect("pi-test", &logger);
        assert_eq!(snap.temperature, 0.0);
        assert_eq!(snap.facts, vec![NetworkFact::hostname("pi-test")]);
        assert_eq!(snap.memory.percent, 30.0);
        assert_eq!(snap.disk.used, "5");
    }
}
