use std::net::IpAddr;

use super::MetricSource;
use crate::Result;

/// Interface name prefixes for container, bridge, VPN and tunnel links.
pub const SKIPPED_PREFIXES: [&str; 6] = ["docker", "br-", "veth", "tailscale", "tun", "tap"];
/// Shown when the hostname cannot be read.
pub const FALLBACK_HOSTNAME: &str = "Pi";
pub const NO_NETWORK: &str = "No network";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    Hostname,
    Lan,
    Wifi,
}

impl FactKind {
    /// Key into the configured icon table.
    pub fn icon_key(&self) -> &'static str {
        match self {
            FactKind::Hostname => "hostname",
            FactKind::Lan => "lan",
            FactKind::Wifi => "wifi",
        }
    }
}

/// One (kind, value) entry of the rotating network line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFact {
    pub kind: FactKind,
    pub value: String,
}

impl NetworkFact {
    pub fn new(kind: FactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn hostname(name: &str) -> Self {
        Self::new(FactKind::Hostname, name)
    }

    /// Placeholder shown when the fact list is empty.
    pub fn no_network() -> Self {
        Self::new(FactKind::Hostname, NO_NETWORK)
    }
}

/// `eth*`/`en*` are wired, `wl*` wireless; virtual links and anything else are dropped.
pub fn classify_interface(name: &str) -> Option<FactKind> {
    if SKIPPED_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return None;
    }
    if name.starts_with("eth") || name.starts_with("en") {
        Some(FactKind::Lan)
    } else if name.starts_with("wl") {
        Some(FactKind::Wifi)
    } else {
        None
    }
}

/// Turn `(interface, address)` pairs into facts, keeping enumeration order.
pub fn facts_from_interfaces<'a, I>(interfaces: I) -> Vec<NetworkFact>
where
    I: IntoIterator<Item = (&'a str, IpAddr)>,
{
    interfaces
        .into_iter()
        .filter_map(|(name, addr)| match addr {
            IpAddr::V4(v4) if !v4.is_loopback() => {
                classify_interface(name).map(|kind| NetworkFact::new(kind, v4.to_string()))
            }
            _ => None,
        })
        .collect()
}

/// Live interface enumeration; never cached so adapters can come and go.
pub struct InterfaceScan;

impl MetricSource for InterfaceScan {
    type Output = Vec<NetworkFact>;

    fn sample(&mut self) -> Result<Vec<NetworkFact>> {
        let interfaces = if_addrs::get_if_addrs()?;
        Ok(facts_from_interfaces(
            interfaces
                .iter()
                .map(|iface| (iface.name.as_str(), iface.ip())),
        ))
    }
}

/// Kernel node name, or [`FALLBACK_HOSTNAME`] when it is empty.
pub fn local_hostname() -> String {
    let uname = rustix::system::uname();
    let name = uname.nodename().to_string_lossy().trim().to_string();
    if name.is_empty() {
        FALLBACK_HOSTNAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn classifies_wired_and_wireless_names() {
        assert_eq!(classify_interface("eth0"), Some(FactKind::Lan));
        assert_eq!(classify_interface("enp3s0"), Some(FactKind::Lan));
        assert_eq!(classify_interface("wlan0"), Some(FactKind::Wifi));
        assert_eq!(classify_interface("wlp2s0"), Some(FactKind::Wifi));
        assert_eq!(classify_interface("usb0"), None);
    }

    #[test]
    fn skips_virtual_interfaces() {
        for name in ["docker0", "br-1a2b", "veth99", "tailscale0", "tun0", "tap1"] {
            assert_eq!(classify_interface(name), None, "{name} should be skipped");
        }
    }

    #[test]
    fn keeps_enumeration_order_and_drops_loopback_and_v6() {
        let facts = facts_from_interfaces([
            ("lo", v4(127, 0, 0, 1)),
            ("wlan0", v4(192, 168, 1, 31)),
            ("eth0", IpAddr::V6(Ipv6Addr::LOCALHOST)),
            ("docker0", v4(172, 17, 0, 1)),
            ("eth0", v4(10, 0, 0, 5)),
        ]);
        assert_eq!(
            facts,
            vec![
                NetworkFact::new(FactKind::Wifi, "192.168.1.31"),
                NetworkFact::new(FactKind::Lan, "10.0.0.5"),
            ]
        );
    }

    #[test]
    fn icon_keys_match_config_table() {
        assert_eq!(FactKind::Hostname.icon_key(), "hostname");
        assert_eq!(FactKind::Lan.icon_key(), "lan");
        assert_eq!(FactKind::Wifi.icon_key(), "wifi");
        assert_eq!(NetworkFact::no_network().value, "No network");
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!local_hostname().is_empty());
    }
}
