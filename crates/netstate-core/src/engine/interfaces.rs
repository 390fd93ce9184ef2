//! Interface lifecycle: removal and bulk updates
//!
//! ## Bulk Update Phases
//!
//! 1. Route teardown for removed interfaces, interfaces going inactive, and
//!    (in full-replace mode) routes missing from the desired set
//! 2. The same teardown for addresses
//! 3. Registry mutation and interface notification
//! 4. Reactivation of whatever the new interface state allows, addresses
//!    before routes
//!
//! Each phase fires its notification before the next phase starts. Observers
//! therefore see a removed route while its address is still present.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use super::NetStateEngine;
use crate::model::{AddressSet, Interface, InterfaceId, RouteSet};

/// Input for [`NetStateEngine::bulk_update`]
#[derive(Debug, Clone, Default)]
pub struct BulkUpdate {
    /// New or changed interface data, keyed by id
    pub update: HashMap<InterfaceId, Interface>,
    /// Interfaces to remove. Removal wins over an update for the same id.
    pub remove: HashSet<InterfaceId>,
    /// Full desired address set, if addresses should be replaced too
    pub desired_addresses: Option<AddressSet>,
    /// Full desired route set, if routes should be replaced too
    pub desired_routes: Option<RouteSet>,
}

impl BulkUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one interface
    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.update.insert(interface.id, interface);
        self
    }

    /// Remove one interface
    pub fn with_removal(mut self, id: impl Into<InterfaceId>) -> Self {
        self.remove.insert(id.into());
        self
    }

    pub fn with_desired_addresses(mut self, addresses: AddressSet) -> Self {
        self.desired_addresses = Some(addresses);
        self
    }

    pub fn with_desired_routes(mut self, routes: RouteSet) -> Self {
        self.desired_routes = Some(routes);
        self
    }
}

impl NetStateEngine {
    /// Remove one interface and everything associated with it
    ///
    /// Routes are torn down and reported first, then addresses, then the
    /// interface itself.
    pub fn remove_interface(&mut self, id: InterfaceId) {
        let Some(entry) = self.registry.get(id) else {
            warn!("Cannot remove unknown interface {}", id);
            return;
        };
        let routes = entry.routes.clone();
        let addresses = entry.addresses.clone();

        let removed_routes = self.deactivate_routes(routes, true);
        self.notify_routes(&RouteSet::new(), &removed_routes);

        let removed_addresses = self.deactivate_addresses(addresses, true);
        self.notify_addresses(&AddressSet::new(), &removed_addresses);

        self.registry.remove(id);
        debug!("Removed interface {}", id);
        self.notify_interfaces(&BTreeSet::new(), &BTreeSet::new(), &BTreeSet::from([id]));
    }

    /// Apply interface additions, changes and removals in one batch
    ///
    /// With `desired_routes` / `desired_addresses` set, entries missing from
    /// the desired sets are removed and the desired entries are (re)activated
    /// after the interface changes, so the call acts as a full replacement.
    pub fn bulk_update(&mut self, mut batch: BulkUpdate) {
        // Removal wins over update; unknown ids are dropped from the removal set
        batch.update.retain(|id, _| !batch.remove.contains(id));
        batch.remove.retain(|&id| {
            let known = self.registry.contains(id);
            if !known {
                warn!("Cannot remove unknown interface {}", id);
            }
            known
        });
        let going_inactive: Vec<InterfaceId> = batch
            .update
            .iter()
            .filter(|(id, data)| !data.is_active() && self.registry.is_active(**id))
            .map(|(id, _)| *id)
            .collect();

        self.teardown_routes(&batch.remove, &going_inactive, batch.desired_routes.as_ref());
        self.teardown_addresses(
            &batch.remove,
            &going_inactive,
            batch.desired_addresses.as_ref(),
        );

        let activated = self.mutate_interfaces(&batch.update, &batch.remove);

        // Phase 4: removals already happened above, only additions remain
        let reactivate_addresses = match batch.desired_addresses {
            Some(desired) => desired,
            None => self.associated_addresses(&activated),
        };
        self.modify_addresses(reactivate_addresses, AddressSet::new());

        let reactivate_routes = match batch.desired_routes {
            Some(desired) => desired,
            None => self.associated_routes(&activated),
        };
        self.modify_routes(reactivate_routes, RouteSet::new());
    }

    /// Phase 1
    fn teardown_routes(
        &mut self,
        remove: &HashSet<InterfaceId>,
        going_inactive: &[InterfaceId],
        desired: Option<&RouteSet>,
    ) {
        let mut removed = RouteSet::new();

        for &id in remove {
            if let Some(entry) = self.registry.get(id) {
                let routes = entry.routes.clone();
                removed.extend(self.deactivate_routes(routes, true));
            }
        }

        for &id in going_inactive {
            if let Some(entry) = self.registry.get(id) {
                let routes = entry.routes.clone();
                removed.extend(self.deactivate_routes(routes, false));
            }
        }

        if let Some(desired) = desired {
            let stale: RouteSet = self
                .registry
                .iter()
                .flat_map(|entry| entry.routes.iter())
                .chain(self.indices.active_routes().iter())
                .filter(|route| !desired.contains(route))
                .cloned()
                .collect();
            removed.extend(self.deactivate_routes(stale, true));
        }

        self.notify_routes(&RouteSet::new(), &removed);
    }

    /// Phase 2
    fn teardown_addresses(
        &mut self,
        remove: &HashSet<InterfaceId>,
        going_inactive: &[InterfaceId],
        desired: Option<&AddressSet>,
    ) {
        let mut removed = AddressSet::new();

        for &id in remove {
            if let Some(entry) = self.registry.get(id) {
                let addresses = entry.addresses.clone();
                removed.extend(self.deactivate_addresses(addresses, true));
            }
        }

        for &id in going_inactive {
            if let Some(entry) = self.registry.get(id) {
                let addresses = entry.addresses.clone();
                removed.extend(self.deactivate_addresses(addresses, false));
            }
        }

        if let Some(desired) = desired {
            let stale: AddressSet = self
                .registry
                .iter()
                .flat_map(|entry| entry.addresses.iter())
                .filter(|address| !desired.contains(address))
                .cloned()
                .collect();
            removed.extend(self.deactivate_addresses(stale, true));
        }

        self.notify_addresses(&AddressSet::new(), &removed);
    }

    /// Phase 3. Returns the ids that became active.
    fn mutate_interfaces(
        &mut self,
        update: &HashMap<InterfaceId, Interface>,
        remove: &HashSet<InterfaceId>,
    ) -> BTreeSet<InterfaceId> {
        debug_assert!(
            update.keys().all(|id| !remove.contains(id)),
            "interface both updated and removed in one batch"
        );

        for &id in remove {
            self.registry.remove(id);
        }

        let mut activated = BTreeSet::new();
        let mut deactivated = BTreeSet::new();
        for (&id, data) in update {
            let now_active = data.is_active();
            let upserted = self.registry.upsert(data.clone());
            if upserted.existed && upserted.was_active == now_active {
                continue;
            }
            if now_active {
                activated.insert(id);
            } else {
                deactivated.insert(id);
            }
        }

        let removed: BTreeSet<InterfaceId> = remove.iter().copied().collect();
        self.notify_interfaces(&activated, &deactivated, &removed);
        activated
    }

    /// Routes naming any of `ids`, wherever they are associated
    ///
    /// A route whose other interface was unknown at activation time sits only
    /// in that other interface's set, so every entry is scanned.
    fn associated_routes(&self, ids: &BTreeSet<InterfaceId>) -> RouteSet {
        if ids.is_empty() {
            return RouteSet::new();
        }
        self.registry
            .iter()
            .flat_map(|entry| entry.routes.iter())
            .filter(|route| route.interfaces().any(|id| ids.contains(&id)))
            .cloned()
            .collect()
    }

    fn associated_addresses(&self, ids: &BTreeSet<InterfaceId>) -> AddressSet {
        ids.iter()
            .filter_map(|&id| self.registry.get(id))
            .flat_map(|entry| entry.addresses.iter().cloned())
            .collect()
    }
}
