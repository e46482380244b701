//! Host identity attached to entries

use std::net::{IpAddr, ToSocketAddrs, UdpSocket};
use tracing::debug;

/// Host name and primary IPv4 address, detected once per client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub name: Option<String>,
    pub ip: Option<String>,
}

impl HostInfo {
    /// Best-effort detection; missing values stay `None`
    pub fn detect() -> Self {
        let name = hostname::get()
            .ok()
            .and_then(|n| n.into_string().ok())
            .filter(|n| !n.is_empty());
        let ip = routed_ipv4()
            .or_else(|| name.as_deref().and_then(resolved_ipv4))
            .map(|ip| ip.to_string());

        debug!(host_name = ?name, host_ip = ?ip, "detected host info");
        Self { name, ip }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ip.is_none()
    }
}

/// Address of the interface that routes outbound IPv4 traffic
///
/// Connecting a UDP socket sends no packets; it only selects a route, so
/// this fails on hosts without a default route.
fn routed_ipv4() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    first_usable_ipv4([socket.local_addr().ok()?.ip()])
}

/// Addresses the system resolver maps the host name to (hosts file, DNS)
fn resolved_ipv4(host_name: &str) -> Option<IpAddr> {
    let addrs = (host_name, 0).to_socket_addrs().ok()?;
    first_usable_ipv4(addrs.map(|addr| addr.ip()))
}

fn first_usable_ipv4(candidates: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    candidates
        .into_iter()
        .find(|ip| ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_ip_is_not_loopback() {
        let info = HostInfo::detect();
        if let Some(ip) = info.ip {
            let ip: IpAddr = ip.parse().unwrap();
            assert!(ip.is_ipv4());
            assert!(!ip.is_loopback());
        }
    }

    #[test]
    fn test_first_usable_skips_loopback_and_v6() {
        let candidates: Vec<IpAddr> = [
            "::1", "127.0.1.1", "0.0.0.0", "fe80::1", "10.0.3.7", "10.0.3.8",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
        assert_eq!(
            first_usable_ipv4(candidates),
            Some("10.0.3.7".parse().unwrap())
        );

        let local_only: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap()];
        assert_eq!(first_usable_ipv4(local_only), None);
    }

    #[test]
    fn test_resolving_localhost_yields_nothing_usable() {
        assert_eq!(resolved_ipv4("localhost"), None);
    }

    #[test]
    fn test_empty() {
        assert!(HostInfo::default().is_empty());
        let info = HostInfo {
            name: Some("box".to_string()),
            ip: None,
        };
        assert!(!info.is_empty());
    }
}
