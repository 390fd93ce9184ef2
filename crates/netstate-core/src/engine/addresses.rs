//! Address activation and address diffs
//!
//! Same shape as the route algorithms with a single interface dependency and
//! no helper indices.

use tracing::{debug, warn};

use super::NetStateEngine;
use crate::model::{Address, AddressSet};

impl NetStateEngine {
    /// Assign `address` to its interface and mark it active if the interface
    /// is active. An unknown interface drops the address entirely.
    pub(crate) fn activate_address(&mut self, address: &Address) -> bool {
        let Some(entry) = self.registry.get_mut(address.iface_id) else {
            warn!(
                "Dropping address {} for unknown interface {}",
                address.local, address.iface_id
            );
            return false;
        };
        entry.addresses.replace(address.clone());
        if !entry.interface.is_active() {
            return false;
        }
        self.indices.insert_address(address);
        true
    }

    /// Deactivate `addresses`, returning the ones that were active
    pub(crate) fn deactivate_addresses(&mut self, addresses: AddressSet, detach: bool) -> AddressSet {
        addresses
            .into_iter()
            .filter(|address| {
                if detach
                    && let Some(entry) = self.registry.get_mut(address.iface_id)
                {
                    entry.addresses.remove(address);
                }
                self.indices.remove_address(address)
            })
            .collect()
    }

    /// Replace every assigned address with `desired`
    pub fn set_addresses(&mut self, desired: AddressSet) {
        let mut previous = self.indices.active_addresses().clone();
        self.indices.clear_addresses();
        for entry in self.registry.iter_mut() {
            entry.addresses.clear();
        }

        let added: AddressSet = desired
            .into_iter()
            .filter(|address| {
                let active = self.activate_address(address);
                let was_active = active && previous.remove(address);
                active && !was_active
            })
            .collect();

        debug!(
            "set_addresses: {} active, {} added, {} removed",
            self.indices.active_addresses().len(),
            added.len(),
            previous.len()
        );
        self.notify_addresses(&added, &previous);
    }

    /// Add and remove individual addresses
    pub fn modify_addresses(&mut self, add: AddressSet, remove: AddressSet) {
        let added: AddressSet = add
            .into_iter()
            .filter(|address| {
                if self.indices.is_address_active(address) || remove.contains(address) {
                    return false;
                }
                self.activate_address(address)
            })
            .collect();
        let removed = self.deactivate_addresses(remove, true);
        self.notify_addresses(&added, &removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, InterfaceFlags, InterfaceId};
    use crate::notify::NoopNotifier;

    fn addr(iface: u32, local: &str, len: u8) -> Address {
        Address::new(iface, local.parse().unwrap(), len)
    }

    #[test]
    fn test_unknown_interface_drops_address() {
        let mut engine = NetStateEngine::new(Box::new(NoopNotifier));
        assert!(!engine.activate_address(&addr(7, "10.0.0.2", 24)));
        assert!(engine.active_addresses().is_empty());
        assert!(engine.interface_addresses(InterfaceId(7)).is_none());
    }

    #[test]
    fn test_inactive_interface_keeps_association() {
        let mut engine = NetStateEngine::new(Box::new(NoopNotifier));
        engine
            .registry
            .upsert(Interface::new(1, "eth0", InterfaceFlags::default()));
        let a = addr(1, "10.0.0.2", 24);

        assert!(!engine.activate_address(&a));
        assert!(engine.interface_addresses(InterfaceId(1)).unwrap().contains(&a));
        assert!(engine.active_addresses().is_empty());
    }

    #[test]
    fn test_reassigning_overwrites_prefix_len() {
        let mut engine = NetStateEngine::new(Box::new(NoopNotifier));
        engine
            .registry
            .upsert(Interface::new(1, "eth0", InterfaceFlags::up_running()));

        engine.activate_address(&addr(1, "10.0.0.2", 24));
        engine.activate_address(&addr(1, "10.0.0.2", 16));

        let stored = engine.active_addresses().iter().next().unwrap();
        assert_eq!(engine.active_addresses().len(), 1);
        assert_eq!(stored.prefix_len, 16);
        let assigned = engine.interface_addresses(InterfaceId(1)).unwrap();
        assert_eq!(assigned.iter().next().unwrap().prefix_len, 16);
    }
}
