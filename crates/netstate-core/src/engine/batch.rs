//! Translation of OS batches and snapshots into engine entry points

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::{BulkUpdate, NetStateEngine};
use crate::events::{Action, EventBatch, NetEvent};
use crate::model::{AddressSet, InterfaceId, RouteSet};
use crate::snapshot::Snapshot;

impl NetStateEngine {
    /// Apply one OS notification
    ///
    /// Interface changes go first through [`bulk_update`](Self::bulk_update)
    /// so that addresses and routes in the same batch see the new interface
    /// state. Addresses are applied before routes. A later event for the same
    /// entity overrides an earlier one.
    pub fn apply_batch(&mut self, batch: EventBatch) {
        let total = batch.len();
        let mut update = HashMap::new();
        let mut remove = HashSet::new();
        let mut add_addresses = AddressSet::new();
        let mut remove_addresses = AddressSet::new();
        let mut add_routes = RouteSet::new();
        let mut remove_routes = RouteSet::new();

        for event in batch {
            match event {
                NetEvent::Interface { entity, action } => match action {
                    Action::Add => {
                        remove.remove(&entity.id);
                        update.insert(entity.id, entity);
                    }
                    Action::Remove => {
                        update.remove(&entity.id);
                        remove.insert(entity.id);
                    }
                },
                NetEvent::Address { entity, action } => match action {
                    Action::Add => {
                        remove_addresses.remove(&entity);
                        add_addresses.replace(entity);
                    }
                    Action::Remove => {
                        add_addresses.remove(&entity);
                        remove_addresses.replace(entity);
                    }
                },
                NetEvent::Route { entity, action } => match action {
                    Action::Add => {
                        remove_routes.remove(&entity);
                        add_routes.insert(entity);
                    }
                    Action::Remove => {
                        add_routes.remove(&entity);
                        remove_routes.insert(entity);
                    }
                },
            }
        }

        debug!("Applying batch of {} event(s)", total);

        if !update.is_empty() || !remove.is_empty() {
            self.bulk_update(BulkUpdate {
                update,
                remove,
                desired_addresses: None,
                desired_routes: None,
            });
        }
        if !add_addresses.is_empty() || !remove_addresses.is_empty() {
            self.modify_addresses(add_addresses, remove_addresses);
        }
        if !add_routes.is_empty() || !remove_routes.is_empty() {
            self.modify_routes(add_routes, remove_routes);
        }
    }

    /// Reconcile the whole state against `snapshot`
    ///
    /// Interfaces missing from the snapshot are removed, the snapshot's
    /// interfaces are upserted, and its addresses and routes replace the
    /// current ones, all in a single bulk update.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let update: HashMap<InterfaceId, _> = snapshot
            .interfaces
            .into_iter()
            .map(|iface| (iface.id, iface))
            .collect();
        let remove: HashSet<InterfaceId> = self
            .registry
            .iter()
            .map(|entry| entry.interface().id)
            .filter(|id| !update.contains_key(id))
            .collect();

        info!(
            "Applying snapshot from {}: {} interface(s), {} address(es), {} route(s), {} stale interface(s)",
            snapshot.taken_at,
            update.len(),
            snapshot.addresses.len(),
            snapshot.routes.len(),
            remove.len()
        );

        self.bulk_update(BulkUpdate {
            update,
            remove,
            desired_addresses: Some(snapshot.addresses),
            desired_routes: Some(snapshot.routes),
        });
    }
}
