//! Built-in change notifiers
//!
//! - [`ChannelNotifier`]: forwards notifications into a bounded channel
//! - [`NoopNotifier`]: discards everything

use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{AddressSet, InterfaceId, RouteSet};
use crate::traits::{ChangeNotifier, NetChange};

/// Notifier that sends every change into a bounded mpsc channel
///
/// The engine never waits on the channel. When the receiver falls behind and
/// the channel is full, the notification is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<NetChange>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver for its changes
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NetChange>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    fn emit(&self, change: NetChange) {
        if let Err(e) = self.tx.try_send(change) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("Change channel full, dropping notification. Consider increasing change_channel_capacity.");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("Change channel closed, dropping notification");
                }
            }
        }
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn on_routes_changed(&self, added: &RouteSet, removed: &RouteSet) {
        self.emit(NetChange::Routes {
            added: added.clone(),
            removed: removed.clone(),
        });
    }

    fn on_addresses_changed(&self, added: &AddressSet, removed: &AddressSet) {
        self.emit(NetChange::Addresses {
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
        self.emit(NetChange::Interfaces {
            activated: activated.clone(),
            deactivated: deactivated.clone(),
            removed: removed.clone(),
        });
    }
}

/// Notifier that ignores every change
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn on_routes_changed(&self, _added: &RouteSet, _removed: &RouteSet) {}

    fn on_addresses_changed(&self, _added: &AddressSet, _removed: &AddressSet) {}

    fn on_interfaces_changed(
        &self,
        _activated: &BTreeSet<InterfaceId>,
        _deactivated: &BTreeSet<InterfaceId>,
        _removed: &BTreeSet<InterfaceId>,
    ) {
    }
}
