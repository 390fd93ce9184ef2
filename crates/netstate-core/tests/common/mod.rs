//! Test doubles and builders shared by the contract tests

#![allow(dead_code)]

use netstate_core::{
    Address, AddressSet, ChangeNotifier, Interface, InterfaceFlags, InterfaceId, NetChange,
    NetStateEngine, Route, RouteSet,
};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Notifier that records every notification in order
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    changes: Arc<Mutex<Vec<NetChange>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub fn changes(&self) -> Vec<NetChange> {
        self.changes.lock().unwrap().clone()
    }

    /// Drain the recorded notifications
    pub fn take(&self) -> Vec<NetChange> {
        std::mem::take(&mut *self.changes.lock().unwrap())
    }

    fn record(&self, change: NetChange) {
        self.changes.lock().unwrap().push(change);
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn on_routes_changed(&self, added: &RouteSet, removed: &RouteSet) {
        self.record(NetChange::Routes {
            added: added.clone(),
            removed: removed.clone(),
        });
    }

    fn on_addresses_changed(&self, added: &AddressSet, removed: &AddressSet) {
        self.record(NetChange::Addresses {
            added: added.clone(),
            removed: removed.clone(),
        });
    }

    fn on_interfaces_changed(
        &self,
        activated: &BTreeSet<InterfaceId>,
        deactivated: &BTreeSet<InterfaceId>,
        removed: &BTreeSet<InterfaceId>,
    ) {
        self.record(NetChange::Interfaces {
            activated: activated.clone(),
            deactivated: deactivated.clone(),
            removed: removed.clone(),
        });
    }
}

/// Engine wired to a recorder the test keeps a handle on
pub fn recording_engine() -> (NetStateEngine, RecordingNotifier) {
    let recorder = RecordingNotifier::new();
    let engine = NetStateEngine::new(Box::new(recorder.clone()));
    (engine, recorder)
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

pub fn up(id: u32, name: &str) -> Interface {
    Interface::new(id, name, InterfaceFlags::up_running())
}

pub fn down(id: u32, name: &str) -> Interface {
    Interface::new(
        id,
        name,
        InterfaceFlags {
            up: true,
            running: false,
            ..InterfaceFlags::default()
        },
    )
}

pub fn default_via(gateway: &str, iface: u32) -> Route {
    Route::new(ip("0.0.0.0"), 0)
        .with_gateway(ip(gateway))
        .with_iface_out(iface)
}

pub fn net_route(dst: &str, len: u8, iface: u32) -> Route {
    Route::new(ip(dst), len).with_iface_out(iface)
}

pub fn addr(iface: u32, local: &str, len: u8) -> Address {
    Address::new(iface, ip(local), len)
}

pub fn routes<const N: usize>(items: [Route; N]) -> RouteSet {
    RouteSet::from(items)
}

pub fn addresses<const N: usize>(items: [Address; N]) -> AddressSet {
    AddressSet::from(items)
}

pub fn ids<const N: usize>(items: [u32; N]) -> BTreeSet<InterfaceId> {
    items.into_iter().map(InterfaceId).collect()
}

pub fn routes_changed(added: RouteSet, removed: RouteSet) -> NetChange {
    NetChange::Routes { added, removed }
}

pub fn addresses_changed(added: AddressSet, removed: AddressSet) -> NetChange {
    NetChange::Addresses { added, removed }
}

pub fn interfaces_changed(
    activated: BTreeSet<InterfaceId>,
    deactivated: BTreeSet<InterfaceId>,
    removed: BTreeSet<InterfaceId>,
) -> NetChange {
    NetChange::Interfaces {
        activated,
        deactivated,
        removed,
    }
}
