// # Change Notifier Trait
//
// The engine reports every state change through a single notifier. Fanning
// notifications out to several listeners is the implementation's concern.
//
// ## Delivery Rules
//
// - Each shape fires at most once per engine call
// - A shape is skipped when both of its sets are empty
// - Within `remove_interface` and `bulk_update`, route notifications fire
//   before address notifications, which fire before interface notifications

use std::collections::BTreeSet;

use crate::model::{AddressSet, InterfaceId, RouteSet};

/// One notification as a value, for recorders and channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetChange {
    Routes {
        added: RouteSet,
        removed: RouteSet,
    },
    Addresses {
        added: AddressSet,
        removed: AddressSet,
    },
    Interfaces {
        activated: BTreeSet<InterfaceId>,
        deactivated: BTreeSet<InterfaceId>,
        removed: BTreeSet<InterfaceId>,
    },
}

/// Sink for engine change notifications
///
/// Implementations are called synchronously from the engine and must not
/// block. Anything slow belongs behind a channel (see
/// [`ChannelNotifier`](crate::notify::ChannelNotifier)).
pub trait ChangeNotifier: Send + Sync {
    /// Active routes were added and/or removed
    fn on_routes_changed(&self, added: &RouteSet, removed: &RouteSet);

    /// Active addresses were added and/or removed
    fn on_addresses_changed(&self, added: &AddressSet, removed: &AddressSet);

    /// Interfaces became active, became inactive, or were removed
    fn on_interfaces_changed(
        &self,
        activated: &BTreeSet<InterfaceId>,
        deactivated: &BTreeSet<InterfaceId>,
        removed: &BTreeSet<InterfaceId>,
    );
}
