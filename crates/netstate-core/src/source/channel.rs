// # Channel Event Source
//
// In-process event source fed through an unbounded sender. Whatever produces
// batches (a stdin reader, an OS listener task, a test) keeps the sender;
// the service consumes the receiving side through `watch()`.
//
// `watch()` hands out the receiver once. Later calls get a stream that ends
// immediately.

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use crate::events::EventBatch;
use crate::snapshot::Snapshot;
use crate::traits::EventSource;

/// Event source backed by an unbounded mpsc channel
pub struct ChannelEventSource {
    name: String,
    initial: Option<Snapshot>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<EventBatch>>>,
}

impl ChannelEventSource {
    /// Create a source and the sender that feeds it
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedSender<EventBatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            name: name.into(),
            initial: None,
            rx: Mutex::new(Some(rx)),
        };
        (source, tx)
    }

    /// Reconcile against `snapshot` before the first batch
    pub fn with_initial(mut self, snapshot: Snapshot) -> Self {
        self.initial = Some(snapshot);
        self
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn initial(&self) -> Result<Option<Snapshot>, crate::Error> {
        Ok(self.initial.clone())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = EventBatch> + Send + 'static>> {
        let rx = self.rx.lock().ok().and_then(|mut guard| guard.take());
        match rx {
            Some(rx) => Box::pin(UnboundedReceiverStream::new(rx)),
            None => {
                warn!("Event source {} is already being watched", self.name);
                Box::pin(tokio_stream::empty())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
