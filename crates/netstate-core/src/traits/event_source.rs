// # Event Source Trait
//
// Defines how OS-reported network changes reach the service.
//
// ## Implementations
//
// - In-process channel: `ChannelEventSource` (tests, stdin reader in netstated)
// - Future: netlink or routing-socket listeners
//
// A source only observes and forwards. It never touches the engine directly;
// the service applies every batch on its single writer task.

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::events::EventBatch;
use crate::snapshot::Snapshot;

/// Trait for event source implementations
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Full state to reconcile against before the first batch, if the source
    /// has one
    async fn initial(&self) -> Result<Option<Snapshot>, crate::Error>;

    /// Stream of change batches
    ///
    /// The stream ends when the source shuts down. Dropping it must release
    /// any resources the source holds for it.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = EventBatch> + Send + 'static>>;

    /// Short name for logs
    fn name(&self) -> &str;
}
