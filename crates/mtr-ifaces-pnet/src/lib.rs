// # pnet Local Addresses
//
// This crate provides a `LocalAddresses` implementation that reads the
// addresses of the host's network interfaces through pnet's datalink layer.
//
// ## Purpose
//
// Automatic address-family selection only prefers IPv6 when the local host
// has a global IPv6 address. This crate answers that question.
//
// ## Platform Support
//
// pnet enumerates interfaces on Linux, macOS, BSD and Windows. Enumeration
// is done fresh on every call; no state is cached.

use mtr_core::traits::LocalAddresses;
use pnet::datalink;
use std::net::IpAddr;
use tracing::trace;

/// Interface enumeration via `pnet::datalink`
#[derive(Debug, Clone, Default)]
pub struct PnetInterfaces {
    /// Restrict to one interface by name
    interface: Option<String>,
}

impl PnetInterfaces {
    /// Enumerate all interfaces that are up
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate only `name` (e.g. `"eth0"`)
    pub fn only(name: impl Into<String>) -> Self {
        Self {
            interface: Some(name.into()),
        }
    }
}

impl LocalAddresses for PnetInterfaces {
    fn addresses(&self) -> Vec<IpAddr> {
        let interfaces = datalink::interfaces()
            .into_iter()
            .filter(|iface| iface.is_up())
            .map(|iface| {
                let ips: Vec<IpAddr> = iface.ips.iter().map(|network| network.ip()).collect();
                (iface.name, ips)
            });
        let addrs = select(interfaces, self.interface.as_deref());
        trace!("Local addresses: {:?}", addrs);
        addrs
    }
}

/// Flatten `(name, addresses)` pairs, keeping only `only` when set
fn select<I>(interfaces: I, only: Option<&str>) -> Vec<IpAddr>
where
    I: IntoIterator<Item = (String, Vec<IpAddr>)>,
{
    interfaces
        .into_iter()
        .filter(|(name, _)| only.is_none_or(|wanted| wanted == name))
        .flat_map(|(_, ips)| ips)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ifaces() -> Vec<(String, Vec<IpAddr>)> {
        vec![
            ("lo".to_string(), vec!["127.0.0.1".parse().unwrap(), "::1".parse().unwrap()]),
            (
                "eth0".to_string(),
                vec!["192.168.1.10".parse().unwrap(), "2001:db8::10".parse().unwrap()],
            ),
        ]
    }

    #[test]
    fn all_interfaces_by_default() {
        assert_eq!(select(ifaces(), None).len(), 4);
    }

    #[test]
    fn single_interface_filter() {
        let addrs = select(ifaces(), Some("eth0"));
        assert_eq!(
            addrs,
            vec![
                "192.168.1.10".parse::<IpAddr>().unwrap(),
                "2001:db8::10".parse::<IpAddr>().unwrap()
            ]
        );
        assert!(select(ifaces(), Some("wlan0")).is_empty());
    }

    #[test]
    fn enumeration_does_not_panic() {
        // Host-dependent; only checks that the datalink call succeeds
        let _ = PnetInterfaces::new().addresses();
    }
}
