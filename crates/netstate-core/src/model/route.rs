// # Route
//
// A kernel routing table entry. Equality covers every field.
//
// ## Classification
//
// - Host route: the destination prefix covers exactly one address
//   (/32 for IPv4, /128 for IPv6)
// - Default route: a zero-length destination prefix, or `2000::/3`, which
//   older kernels report for the IPv6 default route

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv6Addr};

use super::InterfaceId;

/// Set of routes
pub type RouteSet = HashSet<Route>;

/// `2000::`, the destination older kernels use for the IPv6 default route
const LEGACY_V6_DEFAULT_DST: Ipv6Addr = Ipv6Addr::new(0x2000, 0, 0, 0, 0, 0, 0, 0);
const LEGACY_V6_DEFAULT_PREFIX_LEN: u8 = 3;

/// A routing table entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Source address (source routing), if any
    #[serde(default)]
    pub src: Option<IpAddr>,
    /// Destination address
    pub dst: IpAddr,
    /// Next-hop gateway, if any
    #[serde(default)]
    pub gateway: Option<IpAddr>,
    /// Incoming interface constraint
    #[serde(default)]
    pub iface_in: Option<InterfaceId>,
    /// Outgoing interface
    #[serde(default)]
    pub iface_out: Option<InterfaceId>,
    #[serde(default)]
    pub metric: u32,
    pub dst_prefix_len: u8,
    #[serde(default)]
    pub src_prefix_len: u8,
    /// Kernel routing table id
    #[serde(default)]
    pub table: u32,
    /// Routing protocol that installed the route
    #[serde(default)]
    pub protocol: u8,
}

impl Route {
    /// Create a route to `dst/dst_prefix_len` with every other field unset
    pub fn new(dst: IpAddr, dst_prefix_len: u8) -> Self {
        Self {
            src: None,
            dst,
            gateway: None,
            iface_in: None,
            iface_out: None,
            metric: 0,
            dst_prefix_len,
            src_prefix_len: 0,
            table: 0,
            protocol: 0,
        }
    }

    pub fn with_gateway(mut self, gateway: IpAddr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_iface_out(mut self, id: impl Into<InterfaceId>) -> Self {
        self.iface_out = Some(id.into());
        self
    }

    pub fn with_iface_in(mut self, id: impl Into<InterfaceId>) -> Self {
        self.iface_in = Some(id.into());
        self
    }

    pub fn with_src(mut self, src: IpAddr, src_prefix_len: u8) -> Self {
        self.src = Some(src);
        self.src_prefix_len = src_prefix_len;
        self
    }

    pub fn with_metric(mut self, metric: u32) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_table(mut self, table: u32) -> Self {
        self.table = table;
        self
    }

    pub fn with_protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    /// Interfaces this route depends on, incoming first
    pub fn interfaces(&self) -> impl Iterator<Item = InterfaceId> + '_ {
        self.iface_in.into_iter().chain(self.iface_out)
    }

    /// True when the destination prefix covers exactly one address
    pub fn is_host_route(&self) -> bool {
        let full_len = match self.dst {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        self.dst_prefix_len == full_len
    }

    /// True for `/0` destinations and for the legacy `2000::/3` IPv6 encoding
    pub fn is_default_route(&self) -> bool {
        if self.dst_prefix_len == 0 {
            return true;
        }
        self.dst_prefix_len == LEGACY_V6_DEFAULT_PREFIX_LEN
            && self.dst == IpAddr::V6(LEGACY_V6_DEFAULT_DST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_host_route() {
        assert!(Route::new(ip("10.0.0.1"), 32).is_host_route());
        assert!(!Route::new(ip("10.0.0.0"), 24).is_host_route());
        assert!(Route::new(ip("fe80::1"), 128).is_host_route());
        // /32 is not a host route for IPv6
        assert!(!Route::new(ip("2001:db8::"), 32).is_host_route());
    }

    #[test]
    fn test_default_route() {
        assert!(Route::new(ip("0.0.0.0"), 0).is_default_route());
        assert!(Route::new(ip("::"), 0).is_default_route());
        assert!(!Route::new(ip("10.0.0.0"), 8).is_default_route());
    }

    #[test]
    fn test_legacy_ipv6_default_route() {
        assert!(Route::new(ip("2000::"), 3).is_default_route());
        assert!(!Route::new(ip("2001::"), 3).is_default_route());
        assert!(!Route::new(ip("2000::"), 4).is_default_route());
    }

    #[test]
    fn test_interfaces_order() {
        let route = Route::new(ip("0.0.0.0"), 0).with_iface_out(2).with_iface_in(1);
        let ids: Vec<_> = route.interfaces().collect();
        assert_eq!(ids, vec![InterfaceId(1), InterfaceId(2)]);
        assert_eq!(Route::new(ip("0.0.0.0"), 0).interfaces().count(), 0);
    }

    #[test]
    fn test_equality_covers_all_fields() {
        let a = Route::new(ip("10.0.0.0"), 8).with_iface_out(1);
        assert_eq!(a, a.clone());
        assert_ne!(a, a.clone().with_metric(10));
        assert_ne!(a, a.clone().with_table(254));
        assert_ne!(a, a.clone().with_protocol(4));
    }
}
