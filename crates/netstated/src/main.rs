// # netstated - network state daemon
//
// Thin integration layer over netstate-core:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Load the initial snapshot, if any
// 4. Feed JSON-encoded change batches from stdin into the service
// 5. Log every change notification until SIGINT/SIGTERM
//
// ## Configuration
//
// - `NETSTATE_SOURCE`: event source type (stdin)
// - `NETSTATE_SNAPSHOT_PATH`: snapshot to reconcile against at startup
// - `NETSTATE_SAVE_PATH`: where to write the final snapshot on shutdown
// - `NETSTATE_CHANGE_CAPACITY`: change notification channel capacity
// - `NETSTATE_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export NETSTATE_SNAPSHOT_PATH=/var/lib/netstate/snapshot.json
// echo '[{"kind":"interface","action":"add","entity":{"id":5,"name":"eth0","flags":{"up":true,"running":true}}}]' \
//     | netstated
// ```

use anyhow::Result;
use netstate_core::{
    ChannelEventSource, ChannelNotifier, EventBatch, NetChange, NetStateConfig, NetStateEngine,
    NetStateService, Snapshot, SourceConfig,
};
use std::env;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum NetstateExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<NetstateExitCode> for ExitCode {
    fn from(code: NetstateExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    source_type: String,
    snapshot_path: Option<String>,
    save_path: Option<String>,
    change_capacity: Option<usize>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let change_capacity = match env::var("NETSTATE_CHANGE_CAPACITY") {
            Ok(value) => Some(value.parse().map_err(|e| {
                anyhow::anyhow!("NETSTATE_CHANGE_CAPACITY '{}' is not a number: {}", value, e)
            })?),
            Err(_) => None,
        };

        Ok(Self {
            source_type: env::var("NETSTATE_SOURCE").unwrap_or_else(|_| "stdin".to_string()),
            snapshot_path: env::var("NETSTATE_SNAPSHOT_PATH").ok(),
            save_path: env::var("NETSTATE_SAVE_PATH").ok(),
            change_capacity,
            log_level: env::var("NETSTATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate and convert into the core configuration
    fn to_core_config(&self) -> Result<NetStateConfig> {
        let source = match self.source_type.as_str() {
            "stdin" => SourceConfig::Stdin,
            other => anyhow::bail!(
                "NETSTATE_SOURCE '{}' is not supported. Supported sources: stdin",
                other
            ),
        };

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NETSTATE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if let Some(ref path) = self.save_path
            && path.is_empty()
        {
            anyhow::bail!("NETSTATE_SAVE_PATH cannot be empty when set");
        }

        let mut config = NetStateConfig::new();
        config.source = source;
        config.initial_snapshot = self.snapshot_path.clone();
        if let Some(capacity) = self.change_capacity {
            config.engine.change_channel_capacity = capacity;
        }
        config.validate()?;
        Ok(config)
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NetstateExitCode::ConfigError.into();
        }
    };

    let core_config = match config.to_core_config() {
        Ok(core_config) => core_config,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return NetstateExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NetstateExitCode::ConfigError.into();
    }

    info!("Starting netstated daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NetstateExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(core_config, config.save_path).await {
            error!("Daemon error: {}", e);
            NetstateExitCode::RuntimeError
        } else {
            NetstateExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: NetStateConfig, save_path: Option<String>) -> Result<()> {
    let (notifier, changes) = ChannelNotifier::new(config.engine.change_channel_capacity);
    let engine = NetStateEngine::new(Box::new(notifier));

    let (source, batch_tx) = ChannelEventSource::new(config.source.type_name());
    let source = match config.initial_snapshot {
        Some(ref path) => {
            info!("Loading initial snapshot from {}", path);
            source.with_initial(Snapshot::load(path).await?)
        }
        None => source,
    };

    let (service, _handle) = NetStateService::new(engine, Box::new(source), &config.engine)?;

    tokio::spawn(log_changes(changes));
    tokio::spawn(read_stdin_batches(batch_tx));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    info!("Ready to track network state");
    let engine = service.run_with_shutdown(Some(shutdown_rx)).await?;

    if let Some(path) = save_path {
        engine.snapshot().save(&path).await?;
        info!("Saved final snapshot to {}", path);
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Read one JSON `EventBatch` per line from stdin
async fn read_stdin_batches(tx: mpsc::UnboundedSender<EventBatch>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<EventBatch>(&line) {
                    Ok(batch) => {
                        debug!("stdin line {}: batch of {} event(s)", line_no, batch.len());
                        if tx.send(batch).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed batch on stdin line {}: {}", line_no, e),
                }
            }
            Ok(None) => {
                info!("stdin closed after {} line(s)", line_no);
                break;
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

/// Log every change notification
async fn log_changes(mut changes: mpsc::Receiver<NetChange>) {
    while let Some(change) = changes.recv().await {
        match change {
            NetChange::Routes { added, removed } => {
                for route in &added {
                    info!(
                        "route added: {}/{} via {:?} out {:?}",
                        route.dst, route.dst_prefix_len, route.gateway, route.iface_out
                    );
                }
                for route in &removed {
                    info!(
                        "route removed: {}/{} via {:?} out {:?}",
                        route.dst, route.dst_prefix_len, route.gateway, route.iface_out
                    );
                }
            }
            NetChange::Addresses { added, removed } => {
                for address in &added {
                    info!(
                        "address added: {}/{} on {}",
                        address.local, address.prefix_len, address.iface_id
                    );
                }
                for address in &removed {
                    info!(
                        "address removed: {}/{} on {}",
                        address.local, address.prefix_len, address.iface_id
                    );
                }
            }
            NetChange::Interfaces {
                activated,
                deactivated,
                removed,
            } => {
                info!(
                    "interfaces: activated {:?}, deactivated {:?}, removed {:?}",
                    activated, deactivated, removed
                );
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
