//! OS change batches
//!
//! An OS backend reports changes as tuples of an entity and an [`Action`].
//! One OS notification becomes one [`EventBatch`], which the engine applies
//! with [`NetStateEngine::apply_batch`](crate::NetStateEngine::apply_batch).
//!
//! ## Wire Format
//!
//! Batches are plain serde values, so a backend (or the `netstated` stdin
//! reader) can hand them over as JSON:
//!
//! ```json
//! [
//!   {"kind": "interface", "action": "add",
//!    "entity": {"id": 5, "name": "eth0", "flags": {"up": true, "running": true}}},
//!   {"kind": "route", "action": "add",
//!    "entity": {"dst": "0.0.0.0", "dst_prefix_len": 0, "gateway": "10.0.0.1", "iface_out": 5}}
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{Address, Interface, Route};

/// What happened to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Remove,
}

/// One OS-reported change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NetEvent {
    Interface { entity: Interface, action: Action },
    Address { entity: Address, action: Action },
    Route { entity: Route, action: Action },
}

impl NetEvent {
    pub fn interface(entity: Interface, action: Action) -> Self {
        Self::Interface { entity, action }
    }

    pub fn address(entity: Address, action: Action) -> Self {
        Self::Address { entity, action }
    }

    pub fn route(entity: Route, action: Action) -> Self {
        Self::Route { entity, action }
    }
}

/// All changes from one OS notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBatch(pub Vec<NetEvent>);

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: NetEvent) {
        self.0.push(event);
    }

    pub fn with(mut self, event: NetEvent) -> Self {
        self.0.push(event);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<NetEvent>> for EventBatch {
    fn from(events: Vec<NetEvent>) -> Self {
        Self(events)
    }
}

impl IntoIterator for EventBatch {
    type Item = NetEvent;
    type IntoIter = std::vec::IntoIter<NetEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
