//! Interface registry
//!
//! Owns every known interface together with the addresses and routes that
//! reference it. Membership in these per-interface sets does not depend on
//! whether the entry is currently active; activation bookkeeping belongs to
//! the engine.

use std::collections::HashMap;

use crate::model::{AddressSet, Interface, InterfaceId, RouteSet};

/// One registered interface and the entries that reference it
#[derive(Debug, Clone)]
pub struct InterfaceEntry {
    pub(crate) interface: Interface,
    pub(crate) addresses: AddressSet,
    pub(crate) routes: RouteSet,
}

impl InterfaceEntry {
    fn new(interface: Interface) -> Self {
        Self {
            interface,
            addresses: AddressSet::new(),
            routes: RouteSet::new(),
        }
    }

    /// The interface data
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Every address assigned to this interface, active or not
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    /// Every route that names this interface as incoming or outgoing
    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }
}

/// Outcome of [`InterfaceRegistry::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    /// The id was already registered
    pub existed: bool,
    /// The previous data was active (always false for new entries)
    pub was_active: bool,
}

/// Registry of known interfaces, keyed by [`InterfaceId`]
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    entries: HashMap<InterfaceId, InterfaceEntry>,
}

impl InterfaceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an interface entry
    pub fn get(&self, id: InterfaceId) -> Option<&InterfaceEntry> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: InterfaceId) -> Option<&mut InterfaceEntry> {
        self.entries.get_mut(&id)
    }

    /// True when `id` is registered and its interface is active
    pub fn is_active(&self, id: InterfaceId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.interface.is_active())
    }

    /// Insert or replace interface data
    ///
    /// A known id keeps its address and route sets; an unknown id starts with
    /// empty ones.
    pub fn upsert(&mut self, interface: Interface) -> Upserted {
        match self.entries.get_mut(&interface.id) {
            Some(entry) => {
                let was_active = entry.interface.is_active();
                entry.interface = interface;
                Upserted {
                    existed: true,
                    was_active,
                }
            }
            None => {
                self.entries
                    .insert(interface.id, InterfaceEntry::new(interface));
                Upserted {
                    existed: false,
                    was_active: false,
                }
            }
        }
    }

    /// Remove an interface, returning its entry
    pub fn remove(&mut self, id: InterfaceId) -> Option<InterfaceEntry> {
        self.entries.remove(&id)
    }

    /// Iterate over all entries in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut InterfaceEntry> {
        self.entries.values_mut()
    }

    /// Find an interface by name
    pub fn find_by_name(&self, name: &str) -> Option<&InterfaceEntry> {
        self.entries
            .values()
            .find(|entry| entry.interface.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: InterfaceId) -> bool {
        self.entries.contains_key(&id)
    }
}
