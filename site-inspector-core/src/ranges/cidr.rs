//! CIDR parsing and membership.

use std::net::IpAddr;

use ipnet::IpNet;
use log::warn;

/// Parse `a.b.c.d/n` (or an IPv6 prefix). A bare address is a single-host
/// network (`/32` or `/128`). Malformed input yields `None`.
pub fn parse_range(text: &str) -> Option<IpNet> {
    let text = text.trim();
    if text.contains('/') {
        text.parse::<IpNet>().ok().map(|net| net.trunc())
    } else {
        let ip = text.parse::<IpAddr>().ok()?;
        let host_len = if ip.is_ipv4() { 32 } else { 128 };
        IpNet::new(ip, host_len).ok()
    }
}

/// Parse a list of ranges, dropping and logging malformed entries.
pub fn parse_ranges<'a>(source: &str, texts: impl IntoIterator<Item = &'a str>) -> Vec<IpNet> {
    texts
        .into_iter()
        .filter_map(|text| {
            let parsed = parse_range(text);
            if parsed.is_none() {
                warn!("[Ranges] {source}: ignoring malformed range '{text}'");
            }
            parsed
        })
        .collect()
}

/// Whether `ip` falls inside `range`. Either side failing to parse, or an
/// address family mismatch, is a non-match.
pub fn ip_in_range(ip: &str, range: &str) -> bool {
    match (ip.trim().parse::<IpAddr>(), parse_range(range)) {
        (Ok(ip), Some(net)) => net.contains(&ip),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_inclusive() {
        assert!(ip_in_range("104.16.0.0", "104.16.0.0/12"));
        assert!(ip_in_range("104.31.255.255", "104.16.0.0/12"));
        assert!(!ip_in_range("104.32.0.0", "104.16.0.0/12"));
        assert!(!ip_in_range("104.15.255.255", "104.16.0.0/12"));
    }

    #[test]
    fn test_bare_ip_is_single_host() {
        assert!(ip_in_range("13.55.153.74", "13.55.153.74"));
        assert!(!ip_in_range("13.55.153.75", "13.55.153.74"));
    }

    #[test]
    fn test_host_bits_in_prefix_are_masked() {
        assert!(ip_in_range("10.0.0.200", "10.0.0.77/24"));
    }

    #[test]
    fn test_ipv6() {
        assert!(ip_in_range("2606:4700::6810:84e5", "2606:4700::/32"));
        assert!(ip_in_range("2606:4700:ffff:ffff:ffff:ffff:ffff:ffff", "2606:4700::/32"));
        assert!(!ip_in_range("2606:4701::", "2606:4700::/32"));
    }

    #[test]
    fn test_family_mismatch_is_false() {
        assert!(!ip_in_range("151.101.2.191", "2a04:4e40::/32"));
        assert!(!ip_in_range("2a04:4e40::1", "151.101.0.0/16"));
    }

    #[test]
    fn test_malformed_fails_closed() {
        assert!(!ip_in_range("151.101.2.191", "151.101.0.0/33"));
        assert!(!ip_in_range("151.101.2.191", "not-a-range"));
        assert!(!ip_in_range("cdn.amazee.io.", "151.101.0.0/16"));
        assert!(!ip_in_range("151.101.2.191", ""));
    }

    #[test]
    fn test_parse_ranges_drops_bad_entries() {
        let nets = parse_ranges("test", ["10.0.0.0/8", "garbage", "192.168.1.1"]);
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[1].prefix_len(), 32);
    }
}
