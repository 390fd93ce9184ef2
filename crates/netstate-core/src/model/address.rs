// # Address
//
// An IP address assigned to an interface.
//
// ## Equality
//
// Two addresses are the same set member when `(iface_id, local, broadcast)`
// match. `prefix_len` is NOT part of the identity: an address re-announced
// with another prefix length replaces the stored one in place.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

use super::InterfaceId;

/// Set of addresses keyed by `(iface_id, local, broadcast)`
pub type AddressSet = HashSet<Address>;

/// An address assigned to an interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Local address
    pub local: IpAddr,
    /// Broadcast address, or the peer address on point-to-point links
    #[serde(default)]
    pub broadcast: Option<IpAddr>,
    /// Owning interface
    pub iface_id: InterfaceId,
    /// Prefix length (excluded from equality)
    pub prefix_len: u8,
}

impl Address {
    /// Create an address without a broadcast/peer address
    pub fn new(iface_id: impl Into<InterfaceId>, local: IpAddr, prefix_len: u8) -> Self {
        Self {
            local,
            broadcast: None,
            iface_id: iface_id.into(),
            prefix_len,
        }
    }

    /// Set the broadcast (or peer) address
    pub fn with_broadcast(mut self, broadcast: IpAddr) -> Self {
        self.broadcast = Some(broadcast);
        self
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.iface_id == other.iface_id
            && self.local == other.local
            && self.broadcast == other.broadcast
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.iface_id.hash(state);
        self.local.hash(state);
        self.broadcast.hash(state);
    }
}
