//! Active-state indices
//!
//! `active_routes` and `active_addresses` are the global sets of usable
//! entries. Two helper maps speed up common lookups:
//!
//! - `host_routes`: active host routes keyed by destination
//! - `default_routes`: active default routes keyed by outgoing interface
//!
//! The helper maps are caches derived from `active_routes`. A key whose last
//! route is removed is dropped from its map.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use crate::model::{Address, AddressSet, InterfaceId, Route, RouteSet};

#[derive(Debug, Default)]
pub struct ActiveIndices {
    routes: RouteSet,
    host_routes: HashMap<IpAddr, RouteSet>,
    default_routes: HashMap<InterfaceId, RouteSet>,
    addresses: AddressSet,
}

impl ActiveIndices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_routes(&self) -> &RouteSet {
        &self.routes
    }

    pub fn active_addresses(&self) -> &AddressSet {
        &self.addresses
    }

    pub fn is_route_active(&self, route: &Route) -> bool {
        self.routes.contains(route)
    }

    pub fn is_address_active(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Active host routes towards `dst`
    pub fn host_routes(&self, dst: &IpAddr) -> Option<&RouteSet> {
        self.host_routes.get(dst)
    }

    /// Active default routes leaving through `iface`
    pub fn default_routes(&self, iface: InterfaceId) -> Option<&RouteSet> {
        self.default_routes.get(&iface)
    }

    /// Mark a route active and classify it. Re-inserting is a no-op.
    pub(crate) fn insert_route(&mut self, route: &Route) {
        if !self.routes.insert(route.clone()) {
            return;
        }
        if route.is_host_route() {
            self.host_routes
                .entry(route.dst)
                .or_default()
                .insert(route.clone());
        }
        if route.is_default_route()
            && let Some(out) = route.iface_out
        {
            self.default_routes
                .entry(out)
                .or_default()
                .insert(route.clone());
        }
    }

    /// Drop a route from the active set and both helper maps.
    /// Returns false when it was not active.
    pub(crate) fn remove_route(&mut self, route: &Route) -> bool {
        if !self.routes.remove(route) {
            return false;
        }
        if route.is_host_route() {
            remove_from_bucket(&mut self.host_routes, &route.dst, route);
        }
        if route.is_default_route()
            && let Some(out) = route.iface_out
        {
            remove_from_bucket(&mut self.default_routes, &out, route);
        }
        true
    }

    pub(crate) fn clear_routes(&mut self) {
        self.routes.clear();
        self.host_routes.clear();
        self.default_routes.clear();
    }

    /// Mark an address active, replacing an equal entry with a different prefix length
    pub(crate) fn insert_address(&mut self, address: &Address) {
        self.addresses.replace(address.clone());
    }

    pub(crate) fn remove_address(&mut self, address: &Address) -> bool {
        self.addresses.remove(address)
    }

    pub(crate) fn clear_addresses(&mut self) {
        self.addresses.clear();
    }

    /// Rebuild both helper maps from `active_routes` and compare with the live ones
    pub fn is_consistent(&self) -> bool {
        let mut host_routes: HashMap<IpAddr, RouteSet> = HashMap::new();
        let mut default_routes: HashMap<InterfaceId, RouteSet> = HashMap::new();
        for route in &self.routes {
            if route.is_host_route() {
                host_routes.entry(route.dst).or_default().insert(route.clone());
            }
            if route.is_default_route()
                && let Some(out) = route.iface_out
            {
                default_routes.entry(out).or_default().insert(route.clone());
            }
        }
        host_routes == self.host_routes && default_routes == self.default_routes
    }
}

fn remove_from_bucket<K>(map: &mut HashMap<K, HashSet<Route>>, key: &K, route: &Route)
where
    K: std::hash::Hash + Eq,
{
    if let Some(bucket) = map.get_mut(key) {
        bucket.remove(route);
        if bucket.is_empty() {
            map.remove(key);
        }
    }
}
