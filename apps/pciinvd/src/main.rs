//! # PCI Inventory Daemon
//!
//! Hosts the ingestion pipeline and feeds it OEM request payloads from stdin.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()            RUST_LOG or "info,pciinv=debug"          │
//! │  2. InventoryConfig::load()   argv[1] / PCIINV_CONFIG / default path   │
//! │  3. InventoryService::start() queue + named worker thread              │
//! │  4. service.register(router)  NetFn 0x2e / Cmd 0x2a / IANA 49769       │
//! │  5. serve stdin (own thread)  until EOF, Ctrl+C or SIGTERM             │
//! │  6. service.shutdown()        drain, cancel, join                      │
//! │  7. print JSON snapshot       worker status + inventory objects        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod stdin;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pciinv_sync::store::Interfaces;
use pciinv_sync::{InventoryConfig, InventoryService, MemoryInventory, WorkerStatus};

use crate::stdin::LineRouter;

/// Final state written to stdout on exit.
#[derive(Serialize)]
struct Snapshot {
    worker: WorkerStatus,
    objects: BTreeMap<String, Interfaces>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting PCI inventory daemon...");

    let config = InventoryConfig::load(config_path())?;
    info!(
        root = %config.inventory.root,
        policy = %config.queue.reset_policy,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryInventory::new(config.inventory.root.clone()));
    let service = InventoryService::start(config, store.clone())?;

    let mut router = LineRouter::default();
    service.register(&mut router);

    info!("Reading PCI inventory requests from stdin");
    let lines = stdin::spawn_reader(std::io::BufReader::new(std::io::stdin()))?;
    tokio::select! {
        _ = stdin::serve(lines, &router) => {}
        _ = shutdown_signal() => {}
    }

    // Joining the worker blocks; keep it off the runtime threads.
    let worker = tokio::task::spawn_blocking(move || service.shutdown()).await??;

    let snapshot = Snapshot {
        worker,
        objects: store.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    info!("PCI inventory daemon stopped");
    Ok(())
}

/// Initializes tracing subscriber for logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pciinv=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file override: first CLI argument, then `PCIINV_CONFIG`.
fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("PCIINV_CONFIG"))
        .map(PathBuf::from)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
