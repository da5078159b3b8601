//! IANA/IETF reserved address detection.
//!
//! The validation server refuses to connect to any address that is not
//! routable on the public internet, so an A/AAAA record pointing into one of
//! these blocks is always fatal for HTTP-01.

use std::net::IpAddr;
use std::sync::LazyLock;

use ipnetwork::IpNetwork;

/// Non-globally-routable blocks. IPv4-mapped addresses (`::ffff:0:0/96`)
/// are judged by the IPv4 blocks.
const RESERVED_CIDRS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.88.99.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
    "255.255.255.255/32",
    "::/128",
    "::1/128",
    "64:ff9b::/96",
    "100::/64",
    "2001::/32",
    "2001:10::/28",
    "2001:20::/28",
    "2001:db8::/32",
    "2002::/16",
    "fc00::/7",
    "fe80::/10",
    "ff00::/8",
];

static RESERVED_NETWORKS: LazyLock<Vec<IpNetwork>> = LazyLock::new(|| {
    RESERVED_CIDRS
        .iter()
        .filter_map(|cidr| cidr.parse::<IpNetwork>().ok())
        .collect()
});

/// Reports whether `ip` lies in any reserved block.
///
/// # Examples
///
/// ```
/// use acme_precheck::is_address_reserved;
///
/// assert!(is_address_reserved("10.1.2.3".parse().unwrap()));
/// assert!(!is_address_reserved("93.184.216.34".parse().unwrap()));
/// ```
pub fn is_address_reserved(ip: IpAddr) -> bool {
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    };
    RESERVED_NETWORKS.iter().any(|network| network.contains(ip))
}
