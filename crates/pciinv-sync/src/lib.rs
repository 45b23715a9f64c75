//! # pciinv-sync: PCI Inventory Ingestion Pipeline
//!
//! Reflects PCI devices reported by host firmware over an IPMI OEM command
//! into the hardware inventory, decoupled from the request path by a queue
//! and a single background worker.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ingestion Pipeline                               │
//! │                                                                         │
//! │  IPMI daemon thread(s)                    Worker thread                 │
//! │  ─────────────────────                    ─────────────                 │
//! │  ┌────────────────────┐   push/reset   ┌──────────────────────────┐    │
//! │  │ PciInventoryHandler│ ─────────────► │        WorkQueue         │    │
//! │  │ decode 15 bytes    │                │ FIFO + reset + cancel    │    │
//! │  │ reply 0x00 / 0xC7  │                └────────────┬─────────────┘    │
//! │  └────────────────────┘                             │ next_item()      │
//! │                                                     ▼                  │
//! │                                        ┌──────────────────────────┐    │
//! │                                        │ Worker                   │    │
//! │                                        │ Idle / Resetting /       │    │
//! │                                        │ Applying / Terminated    │    │
//! │                                        └────────────┬─────────────┘    │
//! │                                                     │                  │
//! │                                        ┌────────────▼─────────────┐    │
//! │                                        │ InventorySync            │    │
//! │                                        │ add() / reset()          │    │
//! │                                        └────────────┬─────────────┘    │
//! │                                                     │ enumerate/upsert │
//! │                                        ┌────────────▼─────────────┐    │
//! │                                        │ dyn InventoryStore       │    │
//! │                                        └──────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Inventory paths, reset policy, worker settings
//! - [`error`] - Pipeline error types
//! - [`ingress`] - IPMI OEM command handler and router seam
//! - [`inventory`] - Descriptor to inventory object mapping, reset protocol
//! - [`queue`] - Work queue shared by producers and the worker
//! - [`service`] - Startup/shutdown orchestration
//! - [`store`] - Inventory store trait and in-memory store
//! - [`worker`] - Background worker loop and status
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pciinv_sync::{InventoryConfig, InventoryService, MemoryInventory};
//!
//! let config = InventoryConfig::load_or_default(None);
//! let store = Arc::new(MemoryInventory::new(config.inventory.root.clone()));
//!
//! let service = InventoryService::start(config, store)?;
//! service.register(&mut ipmi_router);
//!
//! // ... later
//! let status = service.shutdown()?;
//! println!("applied {} devices", status.applied);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ingress;
pub mod inventory;
pub mod queue;
pub mod service;
pub mod store;
pub mod worker;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{InventoryConfig, InventorySettings, QueueSettings, ResetPolicy, WorkerSettings};
pub use error::{InventoryError, InventoryResult};
pub use ingress::{
    register_pci_inventory_handler, CompletionCode, OemCommand, OemHandler, OemRouter,
    PciInventoryHandler, Privilege, PCIINV_IANA, PCIINV_IPMI_CMD, PCIINV_IPMI_NETFN,
};
pub use inventory::{InventoryRecord, InventorySync, ResetSummary};
pub use queue::{WorkItem, WorkQueue};
pub use service::{InventoryService, InventoryServiceBuilder};
pub use store::{InventoryObject, InventoryStore, MemoryInventory, PropertyValue};
pub use worker::{Worker, WorkerHandle, WorkerState, WorkerStatus};
