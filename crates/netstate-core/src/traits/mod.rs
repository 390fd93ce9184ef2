//! Core traits for the netstate system
//!
//! - [`ChangeNotifier`]: receives added/removed diffs from the engine
//! - [`EventSource`]: pushes OS-reported change batches into the service

pub mod event_source;
pub mod notifier;

pub use event_source::EventSource;
pub use notifier::{ChangeNotifier, NetChange};
