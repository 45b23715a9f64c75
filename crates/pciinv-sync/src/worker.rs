//! # Inventory Worker
//!
//! The single consumer of the [`WorkQueue`]. Runs on its own named OS thread
//! and is the only caller of the inventory store.
//!
//! ## Worker Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Worker::run()                                    │
//! │                                                                         │
//! │   ┌──────────┐   next_item()   ┌─────────────────────┐                 │
//! │   │   Idle   │ ──────────────► │ Reset?              │                 │
//! │   └──────────┘                 │   ResettingInventory│── reset() ──┐   │
//! │        ▲                       │ Device?             │             │   │
//! │        │                       │   ApplyingItem      │── add() ────┤   │
//! │        │                       └─────────────────────┘             │   │
//! │        │                                                           │   │
//! │        └──────────── log error / bump counters ◄───────────────────┘   │
//! │                                                                         │
//! │   next_item() == None (cancelled)  ──►  Terminated                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing item never stops the loop. Panics inside a store call are
//! caught and treated as an [`InventoryError::UnexpectedFault`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::inventory::InventorySync;
use crate::queue::{WorkItem, WorkQueue};

// =============================================================================
// Worker Status
// =============================================================================

/// What the worker is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Blocked waiting for work.
    #[default]
    Idle,
    /// Running a reset cycle.
    ResettingInventory,
    /// Writing one device.
    ApplyingItem,
    /// Loop exited after cancellation.
    Terminated,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Idle => "idle",
            WorkerState::ResettingInventory => "resetting_inventory",
            WorkerState::ApplyingItem => "applying_item",
            WorkerState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Snapshot of worker progress for external queries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerStatus {
    pub state: WorkerState,

    /// Devices written successfully.
    pub applied: u64,

    /// Device writes that failed.
    pub failed: u64,

    /// Reset cycles completed (enumeration succeeded).
    pub resets: u64,

    /// Reset cycles abandoned because enumeration failed.
    pub failed_resets: u64,

    /// Queued devices dropped by reset requests.
    pub discarded: u64,

    pub last_applied_at: Option<DateTime<Utc>>,
    pub last_reset_at: Option<DateTime<Utc>>,

    /// Last error message (if any).
    pub last_error: Option<String>,
}

// =============================================================================
// Worker
// =============================================================================

/// Consumer side of the pipeline.
pub struct Worker {
    queue: WorkQueue,
    inventory: InventorySync,
    status: Arc<Mutex<WorkerStatus>>,
}

impl Worker {
    pub fn new(queue: WorkQueue, inventory: InventorySync) -> Self {
        Worker {
            queue,
            inventory,
            status: Arc::new(Mutex::new(WorkerStatus::default())),
        }
    }

    /// Starts the loop on a dedicated named thread.
    pub fn spawn(self, thread_name: &str) -> InventoryResult<WorkerHandle> {
        let queue = self.queue.clone();
        let status = self.status.clone();

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || self.run())
            .map_err(|e| InventoryError::WorkerSpawn(e.to_string()))?;

        info!(thread = thread_name, "PCI inventory worker spawned");
        Ok(WorkerHandle {
            queue,
            status,
            thread: Some(thread),
        })
    }

    /// Runs the loop on the calling thread until the queue is cancelled.
    pub fn run(self) {
        info!(policy = %self.queue.policy(), "PCI inventory worker started");

        while let Some(item) = self.queue.next_item(|| self.set_state(WorkerState::Idle)) {
            match item {
                WorkItem::Reset => self.apply_reset(),
                WorkItem::Device(dev) => self.apply_device(&dev),
            }
        }

        self.set_state(WorkerState::Terminated);
        info!("PCI inventory worker stopped");
    }

    fn apply_reset(&self) {
        self.set_state(WorkerState::ResettingInventory);

        match self.guarded(InventorySync::reset) {
            Ok(summary) => {
                let mut s = self.status.lock();
                s.resets += 1;
                s.last_reset_at = Some(Utc::now());
                if summary.failed > 0 {
                    s.last_error = Some(format!(
                        "{} PCI objects could not be cleared",
                        summary.failed
                    ));
                }
            }
            Err(e) => {
                error!(?e, "PCI inventory reset abandoned");
                let mut s = self.status.lock();
                s.failed_resets += 1;
                s.last_error = Some(e.to_string());
            }
        }
    }

    fn apply_device(&self, dev: &pciinv_core::DeviceDescriptor) {
        self.set_state(WorkerState::ApplyingItem);

        match self.guarded(|inventory| inventory.add(dev)) {
            Ok(()) => {
                let mut s = self.status.lock();
                s.applied += 1;
                s.last_applied_at = Some(Utc::now());
            }
            Err(e) => {
                error!(
                    ?e,
                    key = %dev.key(),
                    "Failed to write PCI device description to inventory"
                );
                let mut s = self.status.lock();
                s.failed += 1;
                s.last_error = Some(e.to_string());
            }
        }
    }

    /// Runs one store operation, turning a panic into an error.
    fn guarded<T>(
        &self,
        op: impl FnOnce(&InventorySync) -> InventoryResult<T>,
    ) -> InventoryResult<T> {
        panic::catch_unwind(AssertUnwindSafe(|| op(&self.inventory))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(%message, "Panic while processing PCI inventory item");
            Err(InventoryError::UnexpectedFault(message))
        })
    }

    fn set_state(&self, state: WorkerState) {
        self.status.lock().state = state;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// Worker Handle
// =============================================================================

/// Owner's handle to a running worker thread.
///
/// Dropping the handle cancels the queue and joins the thread.
pub struct WorkerHandle {
    queue: WorkQueue,
    status: Arc<Mutex<WorkerStatus>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn status(&self) -> WorkerStatus {
        let mut status = self.status.lock().clone();
        status.discarded = self.queue.discarded();
        status
    }

    pub fn state(&self) -> WorkerState {
        self.status.lock().state
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Asks the worker to stop after its current item.
    pub fn cancel(&self) {
        self.queue.cancel();
    }

    /// Waits for the worker thread to exit and returns its final status.
    /// Does not cancel.
    pub fn join(mut self) -> InventoryResult<WorkerStatus> {
        self.join_thread()?;
        Ok(self.status())
    }

    /// Cancels, joins and returns the final status.
    pub fn shutdown(self) -> InventoryResult<WorkerStatus> {
        self.queue.cancel();
        self.join()
    }

    fn join_thread(&mut self) -> InventoryResult<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|payload| InventoryError::UnexpectedFault(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.queue.cancel();
            if let Err(e) = self.join_thread() {
                error!(?e, "PCI inventory worker exited abnormally");
            }
        }
    }
}
