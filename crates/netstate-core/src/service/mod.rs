//! Single-writer service around the engine
//!
//! The engine does no locking, so everything that touches it runs on one
//! task: the service. It applies batches from an [`EventSource`] and answers
//! requests sent through cloneable [`NetStateHandle`]s.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ EventSource │─── EventBatch ────┐
//! └─────────────┘                   │
//!                                   ▼
//! ┌───────────────┐  Request  ┌────────────────┐  NetChange  ┌────────────┐
//! │ NetStateHandle│──────────▶│ NetStateService│────────────▶│  Notifier  │
//! └───────────────┘◀──────────└────────────────┘             └────────────┘
//!                    oneshot
//! ```
//!
//! ## Lifecycle
//!
//! 1. Create with [`NetStateService::new()`]
//! 2. Start with [`NetStateService::run()`]
//! 3. The initial snapshot from the source (if any) is applied
//! 4. Batches and requests are handled until shutdown
//! 5. The engine is handed back to the caller

use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::NetStateEngine;
use crate::error::{Error, Result};
use crate::events::EventBatch;
use crate::model::{AddressSet, Interface, InterfaceId, RouteSet};
use crate::snapshot::Snapshot;
use crate::traits::EventSource;

/// Requests served by the service task
#[derive(Debug)]
enum Request {
    ApplyBatch(EventBatch, oneshot::Sender<()>),
    ApplySnapshot(Snapshot, oneshot::Sender<()>),
    RemoveInterface(InterfaceId, oneshot::Sender<()>),
    Interfaces(oneshot::Sender<Vec<Interface>>),
    Interface(InterfaceId, oneshot::Sender<Option<Interface>>),
    InterfaceByName(String, oneshot::Sender<Option<Interface>>),
    InterfaceAddresses(InterfaceId, oneshot::Sender<Option<AddressSet>>),
    InterfaceRoutes(InterfaceId, oneshot::Sender<Option<RouteSet>>),
    ActiveAddresses(oneshot::Sender<AddressSet>),
    ActiveRoutes(oneshot::Sender<RouteSet>),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Service task owning a [`NetStateEngine`]
pub struct NetStateService {
    engine: NetStateEngine,
    source: Box<dyn EventSource>,
    requests: mpsc::Receiver<Request>,
}

impl NetStateService {
    /// Create a service and a handle for talking to it
    pub fn new(
        engine: NetStateEngine,
        source: Box<dyn EventSource>,
        config: &EngineConfig,
    ) -> Result<(Self, NetStateHandle)> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.request_channel_capacity);
        let service = Self {
            engine,
            source,
            requests: rx,
        };
        Ok((service, NetStateHandle { tx }))
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<NetStateEngine> {
        self.run_internal(None).await
    }

    /// Run until `shutdown_rx` fires (or, without one, until the source and
    /// every handle are gone)
    pub async fn run_with_shutdown(
        self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<NetStateEngine> {
        self.run_internal(Some(shutdown_rx)).await
    }

    /// `shutdown` is `None` for production (Ctrl-C), `Some(rx)` for a
    /// programmatic shutdown
    async fn run_internal(
        mut self,
        shutdown: Option<Option<oneshot::Receiver<()>>>,
    ) -> Result<NetStateEngine> {
        info!("Starting netstate service with source {}", self.source.name());

        if let Some(snapshot) = self.source.initial().await? {
            self.engine.apply_snapshot(snapshot);
        }

        let mut batches = self.source.watch();
        let mut source_open = true;
        let mut handles_open = true;

        let shutdown_signal = async move {
            match shutdown {
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
                Some(Some(rx)) => {
                    let _ = rx.await;
                }
                Some(None) => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown_signal);

        while source_open || handles_open {
            tokio::select! {
                batch = batches.next(), if source_open => match batch {
                    Some(batch) => {
                        debug!("Received batch of {} event(s)", batch.len());
                        self.engine.apply_batch(batch);
                    }
                    None => {
                        info!("Event source {} closed", self.source.name());
                        source_open = false;
                    }
                },

                request = self.requests.recv(), if handles_open => match request {
                    Some(request) => self.handle_request(request),
                    None => {
                        debug!("All service handles dropped");
                        handles_open = false;
                    }
                },

                _ = &mut shutdown_signal => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("Netstate service stopped");
        Ok(self.engine)
    }

    fn handle_request(&mut self, request: Request) {
        let engine = &mut self.engine;
        // A dropped reply receiver only means the caller stopped waiting
        match request {
            Request::ApplyBatch(batch, reply) => {
                engine.apply_batch(batch);
                let _ = reply.send(());
            }
            Request::ApplySnapshot(snapshot, reply) => {
                engine.apply_snapshot(snapshot);
                let _ = reply.send(());
            }
            Request::RemoveInterface(id, reply) => {
                engine.remove_interface(id);
                let _ = reply.send(());
            }
            Request::Interfaces(reply) => {
                let _ = reply.send(engine.interfaces());
            }
            Request::Interface(id, reply) => {
                let _ = reply.send(engine.interface(id).cloned());
            }
            Request::InterfaceByName(name, reply) => {
                let _ = reply.send(engine.interface_by_name(&name).cloned());
            }
            Request::InterfaceAddresses(id, reply) => {
                let _ = reply.send(engine.interface_addresses(id).cloned());
            }
            Request::InterfaceRoutes(id, reply) => {
                let _ = reply.send(engine.interface_routes(id).cloned());
            }
            Request::ActiveAddresses(reply) => {
                let _ = reply.send(engine.active_addresses().clone());
            }
            Request::ActiveRoutes(reply) => {
                let _ = reply.send(engine.active_routes().clone());
            }
            Request::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
            }
        }
    }
}

/// Cloneable handle to a running [`NetStateService`]
#[derive(Debug, Clone)]
pub struct NetStateHandle {
    tx: mpsc::Sender<Request>,
}

impl NetStateHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| Error::service("Service is not running"))?;
        reply_rx
            .await
            .map_err(|_| Error::service("Service stopped before replying"))
    }

    /// Apply one OS change batch
    pub async fn apply_batch(&self, batch: EventBatch) -> Result<()> {
        self.request(|reply| Request::ApplyBatch(batch, reply)).await
    }

    /// Reconcile against a full snapshot
    pub async fn apply_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.request(|reply| Request::ApplySnapshot(snapshot, reply))
            .await
    }

    pub async fn remove_interface(&self, id: InterfaceId) -> Result<()> {
        self.request(|reply| Request::RemoveInterface(id, reply)).await
    }

    pub async fn interfaces(&self) -> Result<Vec<Interface>> {
        self.request(Request::Interfaces).await
    }

    pub async fn interface(&self, id: InterfaceId) -> Result<Option<Interface>> {
        self.request(|reply| Request::Interface(id, reply)).await
    }

    pub async fn interface_by_name(&self, name: impl Into<String>) -> Result<Option<Interface>> {
        let name = name.into();
        self.request(|reply| Request::InterfaceByName(name, reply))
            .await
    }

    pub async fn interface_addresses(&self, id: InterfaceId) -> Result<Option<AddressSet>> {
        self.request(|reply| Request::InterfaceAddresses(id, reply))
            .await
    }

    pub async fn interface_routes(&self, id: InterfaceId) -> Result<Option<RouteSet>> {
        self.request(|reply| Request::InterfaceRoutes(id, reply))
            .await
    }

    pub async fn active_addresses(&self) -> Result<AddressSet> {
        self.request(Request::ActiveAddresses).await
    }

    pub async fn active_routes(&self) -> Result<RouteSet> {
        self.request(Request::ActiveRoutes).await
    }

    /// Capture the current state
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(Request::Snapshot).await
    }
}
