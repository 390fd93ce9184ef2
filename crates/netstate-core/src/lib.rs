// # netstate-core
//
// In-memory view of a host's network configuration (interfaces, their
// addresses, and the routing table), kept consistent with a stream of
// OS-reported changes.
//
// ## Architecture Overview
//
// - **Model**: `Interface`, `Address` and `Route` values
// - **InterfaceRegistry**: every known interface plus the addresses and
//   routes that reference it, active or not
// - **ActiveIndices**: the active route/address sets and the host-route and
//   default-route lookup maps derived from them
// - **NetStateEngine**: activation rules and the diffing entry points that
//   report minimal added/removed sets to a `ChangeNotifier`
// - **NetStateService**: single-writer task feeding the engine from an
//   `EventSource` and serving queries through `NetStateHandle`
//
// ## Design Principles
//
// 1. **Single Writer**: the engine never locks; the service serializes access
// 2. **Minimal Diffs**: each notification shape fires at most once per call
//    and only when something changed
// 3. **Non-fatal Errors**: references to unknown interfaces are logged and
//    treated as inactive, never aborting a batch
// 4. **Library-First**: the daemon is a thin layer over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod index;
pub mod model;
pub mod notify;
pub mod registry;
pub mod service;
pub mod snapshot;
pub mod source;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, NetStateConfig, SourceConfig};
pub use engine::{BulkUpdate, NetStateEngine};
pub use error::{Error, Result};
pub use events::{Action, EventBatch, NetEvent};
pub use model::{Address, AddressSet, Interface, InterfaceFlags, InterfaceId, Route, RouteSet};
pub use notify::{ChannelNotifier, NoopNotifier};
pub use service::{NetStateHandle, NetStateService};
pub use snapshot::Snapshot;
pub use source::ChannelEventSource;
pub use traits::{ChangeNotifier, EventSource, NetChange};
