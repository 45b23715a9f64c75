//! # Inventory Service
//!
//! Wires configuration, store, queue, worker and IPMI handler together.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     InventoryService                                    │
//! │                                                                         │
//! │  start(config, store)                                                  │
//! │     ├── validate config                                                │
//! │     ├── WorkQueue::new(reset_policy)                                   │
//! │     └── Worker::spawn(thread_name) ──► worker thread running           │
//! │                                                                         │
//! │  register(router)     handler() / queue()     status()                 │
//! │                                                                         │
//! │  shutdown()                                                            │
//! │     ├── wait_drained(shutdown_drain)   best effort                     │
//! │     ├── cancel                                                         │
//! │     └── join worker                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::InventoryConfig;
use crate::error::{InventoryError, InventoryResult};
use crate::ingress::{register_pci_inventory_handler, OemRouter, PciInventoryHandler};
use crate::inventory::InventorySync;
use crate::queue::WorkQueue;
use crate::store::InventoryStore;
use crate::worker::{Worker, WorkerHandle, WorkerStatus};

// =============================================================================
// Inventory Service
// =============================================================================

/// A running ingestion pipeline.
pub struct InventoryService {
    config: InventoryConfig,
    queue: WorkQueue,
    worker: Option<WorkerHandle>,
}

impl InventoryService {
    /// Validates `config` and starts the worker thread.
    pub fn start(config: InventoryConfig, store: Arc<dyn InventoryStore>) -> InventoryResult<Self> {
        config.validate()?;

        info!(
            root = %config.inventory.root,
            pci_root = %config.inventory.pci_root,
            policy = %config.queue.reset_policy,
            "Starting PCI inventory service"
        );

        let queue = WorkQueue::new(config.queue.reset_policy);
        let inventory = InventorySync::new(store, config.inventory.clone());
        let worker = Worker::new(queue.clone(), inventory).spawn(&config.worker.thread_name)?;

        Ok(InventoryService {
            config,
            queue,
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// A handler feeding this service's queue.
    pub fn handler(&self) -> PciInventoryHandler {
        PciInventoryHandler::new(self.queue.clone())
    }

    /// Registers the OEM command with the IPMI dispatcher.
    pub fn register<R: OemRouter + ?Sized>(&self, router: &mut R) {
        register_pci_inventory_handler(router, self.queue.clone());
    }

    /// Returns the current worker status.
    pub fn status(&self) -> WorkerStatus {
        self.worker
            .as_ref()
            .map(WorkerHandle::status)
            .unwrap_or_default()
    }

    /// Blocks until all queued work has been applied, or `timeout` elapses.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.queue.wait_drained(timeout)
    }

    /// Stops the service gracefully.
    ///
    /// Gives the worker up to `worker.shutdown_drain_secs` to finish queued
    /// work, then cancels whatever is left and joins the thread.
    pub fn shutdown(mut self) -> InventoryResult<WorkerStatus> {
        info!("Shutting down PCI inventory service");

        let drain = self.config.worker.shutdown_drain();
        if !self.queue.wait_drained(drain) {
            warn!(
                pending = self.queue.len(),
                drain_secs = drain.as_secs(),
                "PCI inventory queue not drained before shutdown"
            );
        }

        let worker = self
            .worker
            .take()
            .ok_or_else(|| InventoryError::UnexpectedFault("worker already stopped".into()))?;
        let status = worker.shutdown()?;

        info!(
            applied = status.applied,
            failed = status.failed,
            resets = status.resets,
            discarded = status.discarded,
            "PCI inventory service stopped"
        );
        Ok(status)
    }
}

impl Drop for InventoryService {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.shutdown() {
                warn!(?e, "PCI inventory worker exited abnormally");
            }
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`InventoryService`].
pub struct InventoryServiceBuilder {
    config: Option<InventoryConfig>,
    store: Option<Arc<dyn InventoryStore>>,
}

impl InventoryServiceBuilder {
    pub fn new() -> Self {
        InventoryServiceBuilder {
            config: None,
            store: None,
        }
    }

    pub fn config(mut self, config: InventoryConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn InventoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Starts the service. A missing config falls back to defaults.
    pub fn start(self) -> InventoryResult<InventoryService> {
        let store = self
            .store
            .ok_or_else(|| InventoryError::InvalidConfig("Inventory store required".into()))?;
        InventoryService::start(self.config.unwrap_or_default(), store)
    }
}

impl Default for InventoryServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryInventory;
    use crate::worker::WorkerState;
    use pciinv_core::{DeviceDescriptor, PciAddress, PciMessage};

    fn memory() -> Arc<MemoryInventory> {
        Arc::new(MemoryInventory::new(InventoryConfig::default().inventory.root))
    }

    #[test]
    fn test_builder_requires_store() {
        let err = InventoryServiceBuilder::new().start().err().unwrap();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let mut config = InventoryConfig::default();
        config.worker.thread_name.clear();
        let err = InventoryService::start(config, memory()).err().unwrap();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let store = memory();
        let service = InventoryServiceBuilder::new()
            .store(store.clone())
            .start()
            .unwrap();

        let payload = PciMessage {
            reset: false,
            device: DeviceDescriptor::new(PciAddress::new(0, 0, 0x1f, 0), 0x8086, 0xa1b2, 0x060100, 3),
        }
        .encode();
        assert!(service.handler().handle(&payload).is_success());

        let status = service.shutdown().unwrap();
        assert_eq!(status.state, WorkerState::Terminated);
        assert_eq!(status.applied, 1);
        assert!(store
            .object("/system/chassis/motherboard/PCI0000001f0")
            .is_some());
    }

    #[test]
    fn test_shutdown_with_huge_drain_window() {
        let mut config = InventoryConfig::default();
        config.worker.shutdown_drain_secs = u64::MAX;
        assert!(config.validate().is_ok());

        let service = InventoryService::start(config, memory()).unwrap();
        let status = service.shutdown().unwrap();
        assert_eq!(status.state, WorkerState::Terminated);
    }

    #[test]
    fn test_drop_stops_worker() {
        let service = InventoryService::start(InventoryConfig::default(), memory()).unwrap();
        let queue = service.queue().clone();
        drop(service);
        assert!(queue.is_cancelled());
    }
}
