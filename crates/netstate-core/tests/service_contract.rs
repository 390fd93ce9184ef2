//! Contract Test: Single-Writer Service
//!
//! Verifies that the service:
//! - applies the source's initial snapshot before anything else
//! - applies batches from the event source
//! - serves queries and mutations through handles
//! - stops on the shutdown signal and hands the engine back
//! - reports a service error to handles once stopped
//!
//! If this test fails, concurrent callers can observe inconsistent state.

mod common;

use common::*;
use netstate_core::{
    Action, ChannelEventSource, ChannelNotifier, EngineConfig, Error, EventBatch, InterfaceId,
    NetChange, NetEvent, NetStateEngine, NetStateService, Snapshot,
};
use std::time::Duration;
use tokio::time::timeout;

fn initial_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.interfaces.push(up(5, "eth0"));
    snapshot.addresses.insert(addr(5, "10.0.0.2", 24));
    snapshot
}

#[tokio::test]
async fn service_applies_initial_snapshot_and_batches() {
    let (notifier, mut changes) = ChannelNotifier::new(16);
    let engine = NetStateEngine::new(Box::new(notifier));
    let (source, batch_tx) = ChannelEventSource::new("test");
    let source = source.with_initial(initial_snapshot());

    let (service, handle) =
        NetStateService::new(engine, Box::new(source), &EngineConfig::default())
            .expect("service construction succeeds");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let service_task = tokio::spawn(service.run_with_shutdown(Some(shutdown_rx)));

    // Initial snapshot: interface activated, then its address
    let first = timeout(Duration::from_secs(1), changes.recv()).await.unwrap();
    assert_eq!(first, Some(interfaces_changed(ids([5]), ids([]), ids([]))));
    let second = timeout(Duration::from_secs(1), changes.recv()).await.unwrap();
    assert!(matches!(second, Some(NetChange::Addresses { .. })));

    let route = default_via("10.0.0.1", 5);
    batch_tx
        .send(EventBatch::new().with(NetEvent::route(route.clone(), Action::Add)))
        .unwrap();
    let third = timeout(Duration::from_secs(1), changes.recv()).await.unwrap();
    assert_eq!(third, Some(routes_changed(routes([route.clone()]), routes([]))));

    assert_eq!(handle.active_routes().await.unwrap(), routes([route.clone()]));
    assert_eq!(
        handle.interface_by_name("eth0").await.unwrap().map(|iface| iface.id),
        Some(InterfaceId(5))
    );
    assert_eq!(handle.interfaces().await.unwrap().len(), 1);

    shutdown_tx.send(()).unwrap();
    let engine = service_task.await.unwrap().unwrap();
    assert!(engine.is_route_active(&route));
}

#[tokio::test]
async fn handle_mutations_are_serialized() {
    let recorder = RecordingNotifier::new();
    let engine = NetStateEngine::new(Box::new(recorder.clone()));
    let (source, _batch_tx) = ChannelEventSource::new("test");

    let (service, handle) =
        NetStateService::new(engine, Box::new(source), &EngineConfig::default()).unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let service_task = tokio::spawn(service.run_with_shutdown(Some(shutdown_rx)));

    let address = addr(5, "10.0.0.2", 24);
    handle
        .apply_batch(
            EventBatch::new()
                .with(NetEvent::interface(up(5, "eth0"), Action::Add))
                .with(NetEvent::address(address.clone(), Action::Add)),
        )
        .await
        .unwrap();

    assert_eq!(handle.active_addresses().await.unwrap(), addresses([address.clone()]));
    assert_eq!(
        handle.interface_addresses(InterfaceId(5)).await.unwrap(),
        Some(addresses([address]))
    );

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.interfaces.len(), 1);

    handle.remove_interface(InterfaceId(5)).await.unwrap();
    assert!(handle.interface(InterfaceId(5)).await.unwrap().is_none());
    assert!(handle.interface_routes(InterfaceId(5)).await.unwrap().is_none());

    handle.apply_snapshot(snapshot).await.unwrap();
    assert!(handle.interface(InterfaceId(5)).await.unwrap().is_some());

    shutdown_tx.send(()).unwrap();
    service_task.await.unwrap().unwrap();

    let err = handle.active_routes().await.unwrap_err();
    assert!(matches!(err, Error::Service(_)));

    // interface up, address added, removal cascade (address, interface),
    // snapshot restore (interface, address)
    assert_eq!(recorder.changes().len(), 6);
}

#[tokio::test]
async fn service_stops_when_source_and_handles_are_gone() {
    let engine = NetStateEngine::new(Box::new(RecordingNotifier::new()));
    let (source, batch_tx) = ChannelEventSource::new("test");
    let (service, handle) =
        NetStateService::new(engine, Box::new(source), &EngineConfig::default()).unwrap();

    batch_tx
        .send(EventBatch::new().with(NetEvent::interface(up(1, "lo"), Action::Add)))
        .unwrap();
    drop(batch_tx);
    drop(handle);

    let engine = timeout(Duration::from_secs(1), service.run_with_shutdown(None))
        .await
        .expect("service stops on its own")
        .unwrap();
    assert!(engine.interface(InterfaceId(1)).is_some());
}

#[test]
fn zero_request_capacity_is_rejected() {
    let engine = NetStateEngine::new(Box::new(RecordingNotifier::new()));
    let (source, _batch_tx) = ChannelEventSource::new("test");
    let config = EngineConfig {
        request_channel_capacity: 0,
        ..EngineConfig::default()
    };
    assert!(NetStateService::new(engine, Box::new(source), &config).is_err());
}
