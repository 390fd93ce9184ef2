//! Reconciliation engine
//!
//! The engine owns the interface registry and the active-state indices and is
//! the only thing that mutates them. Each entry point computes the minimal
//! added/removed diff and reports it through the [`ChangeNotifier`].
//!
//! ## Entry Points
//!
//! ```text
//!   set_routes / set_addresses        full replacement of one entity kind
//!   modify_routes / modify_addresses  incremental add + remove
//!   remove_interface                  one interface and everything on it
//!   bulk_update                       interface lifecycle, optionally with
//!                                     full-replace address/route sets
//! ```
//!
//! ## Activity
//!
//! A route is active when every interface it names (incoming and/or
//! outgoing) exists and is up and running. A route naming no interface is
//! always active. An address is active when its interface exists and is
//! active; an address naming an unknown interface is dropped.
//!
//! ## Threading
//!
//! Single writer. The engine does no locking, no I/O and never suspends;
//! callers that share it across tasks must serialize access (see
//! [`NetStateService`](crate::service::NetStateService)).

mod addresses;
mod batch;
mod interfaces;
mod routes;

pub use interfaces::BulkUpdate;

use std::collections::BTreeSet;
use std::net::IpAddr;

use chrono::Utc;
use tracing::debug;

use crate::index::ActiveIndices;
use crate::model::{AddressSet, Interface, InterfaceId, Route, RouteSet};
use crate::registry::{InterfaceEntry, InterfaceRegistry};
use crate::snapshot::Snapshot;
use crate::traits::ChangeNotifier;

/// In-memory network state with change reconciliation
pub struct NetStateEngine {
    registry: InterfaceRegistry,
    indices: ActiveIndices,
    notifier: Box<dyn ChangeNotifier>,
}

impl NetStateEngine {
    /// Create an empty engine reporting to `notifier`
    pub fn new(notifier: Box<dyn ChangeNotifier>) -> Self {
        Self {
            registry: InterfaceRegistry::new(),
            indices: ActiveIndices::new(),
            notifier,
        }
    }

    /// The interface registry
    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// The active-state indices
    pub fn indices(&self) -> &ActiveIndices {
        &self.indices
    }

    /// All known interfaces, sorted by id
    pub fn interfaces(&self) -> Vec<Interface> {
        let mut interfaces: Vec<_> = self
            .registry
            .iter()
            .map(|entry| entry.interface().clone())
            .collect();
        interfaces.sort_by_key(|iface| iface.id);
        interfaces
    }

    pub fn interface(&self, id: InterfaceId) -> Option<&Interface> {
        self.registry.get(id).map(InterfaceEntry::interface)
    }

    pub fn interface_by_name(&self, name: &str) -> Option<&Interface> {
        self.registry.find_by_name(name).map(InterfaceEntry::interface)
    }

    /// Every address on `id`, active or not
    pub fn interface_addresses(&self, id: InterfaceId) -> Option<&AddressSet> {
        self.registry.get(id).map(InterfaceEntry::addresses)
    }

    /// Every route referencing `id`, active or not
    pub fn interface_routes(&self, id: InterfaceId) -> Option<&RouteSet> {
        self.registry.get(id).map(InterfaceEntry::routes)
    }

    pub fn active_routes(&self) -> &RouteSet {
        self.indices.active_routes()
    }

    pub fn active_addresses(&self) -> &AddressSet {
        self.indices.active_addresses()
    }

    pub fn is_route_active(&self, route: &Route) -> bool {
        self.indices.is_route_active(route)
    }

    /// Active host routes towards `dst`
    pub fn host_routes(&self, dst: &IpAddr) -> Option<&RouteSet> {
        self.indices.host_routes(dst)
    }

    /// Active default routes leaving through `iface`
    pub fn default_routes(&self, iface: InterfaceId) -> Option<&RouteSet> {
        self.indices.default_routes(iface)
    }

    /// Capture the registry: every interface with all its addresses and
    /// routes, plus active routes that reference no interface
    pub fn snapshot(&self) -> Snapshot {
        let mut addresses = AddressSet::new();
        let mut routes: RouteSet = self
            .indices
            .active_routes()
            .iter()
            .filter(|route| route.interfaces().next().is_none())
            .cloned()
            .collect();
        for entry in self.registry.iter() {
            addresses.extend(entry.addresses().iter().cloned());
            routes.extend(entry.routes().iter().cloned());
        }
        Snapshot {
            taken_at: Utc::now(),
            interfaces: self.interfaces(),
            addresses,
            routes,
        }
    }

    fn notify_routes(&self, added: &RouteSet, removed: &RouteSet) {
        if added.is_empty() && removed.is_empty() {
            return;
        }
        debug!(
            "Routes changed: {} added, {} removed",
            added.len(),
            removed.len()
        );
        self.notifier.on_routes_changed(added, removed);
    }

    fn notify_addresses(&self, added: &AddressSet, removed: &AddressSet) {
        if added.is_empty() && removed.is_empty() {
            return;
        }
        debug!(
            "Addresses changed: {} added, {} removed",
            added.len(),
            removed.len()
        );
        self.notifier.on_addresses_changed(added, removed);
    }

    fn notify_interfaces(
        &self,
        activated: &BTreeSet<InterfaceId>,
        deactivated: &BTreeSet<InterfaceId>,
        removed: &BTreeSet<InterfaceId>,
    ) {
        if activated.is_empty() && deactivated.is_empty() && removed.is_empty() {
            return;
        }
        debug!(
            "Interfaces changed: activated {:?}, deactivated {:?}, removed {:?}",
            activated, deactivated, removed
        );
        self.notifier
            .on_interfaces_changed(activated, deactivated, removed);
    }
}

impl std::fmt::Debug for NetStateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStateEngine")
            .field("registry", &self.registry)
            .field("indices", &self.indices)
            .finish_non_exhaustive()
    }
}
