//! # Work Queue
//!
//! Unbounded FIFO between the IPMI handler (producers) and the single
//! inventory worker (consumer).
//!
//! ## Shared State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mutex<QueueState>                                    │
//! │                                                                         │
//! │  items           VecDeque<DeviceDescriptor>   push_back / pop_front    │
//! │  reset_pending   bool                         request_reset()          │
//! │  cancel_pending  bool                         cancel()                 │
//! │  busy            bool                         worker mid-item          │
//! │                                                                         │
//! │  wake     Condvar ──► worker    (push, reset, cancel)                  │
//! │  drained  Condvar ──► waiters   (worker found nothing to do, cancel)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is only held for O(1) bookkeeping, never across a store call.
//! Producers never block on the worker and never see an error.

use parking_lot::{Condvar, Mutex};
use pciinv_core::DeviceDescriptor;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::ResetPolicy;

// =============================================================================
// Work Item
// =============================================================================

/// Next unit of work handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Write one device to the inventory.
    Device(DeviceDescriptor),
    /// Mark every known PCI object absent.
    Reset,
}

// =============================================================================
// Queue State
// =============================================================================

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<DeviceDescriptor>,
    reset_pending: bool,
    cancel_pending: bool,
    busy: bool,
    discarded: u64,
}

impl QueueState {
    fn is_drained(&self) -> bool {
        self.items.is_empty() && !self.reset_pending && !self.busy
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
    drained: Condvar,
    policy: ResetPolicy,
}

// =============================================================================
// Work Queue
// =============================================================================

/// Cloneable handle to one work queue. All clones share the same state.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    shared: Arc<Shared>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        WorkQueue::new(ResetPolicy::default())
    }
}

impl WorkQueue {
    pub fn new(policy: ResetPolicy) -> Self {
        WorkQueue {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                wake: Condvar::new(),
                drained: Condvar::new(),
                policy,
            }),
        }
    }

    pub fn policy(&self) -> ResetPolicy {
        self.shared.policy
    }

    /// Appends a device to the tail and wakes the worker.
    pub fn push(&self, device: DeviceDescriptor) {
        let depth = {
            let mut state = self.shared.state.lock();
            state.items.push_back(device);
            state.items.len()
        };
        self.shared.wake.notify_one();
        debug!(depth, "PCI device queued");
    }

    /// Schedules a reset cycle ahead of any further device processing.
    ///
    /// With [`ResetPolicy::Discard`] device items queued before this call are
    /// dropped; with [`ResetPolicy::Keep`] they apply after the reset.
    pub fn request_reset(&self) {
        let dropped = {
            let mut state = self.shared.state.lock();
            let dropped = match self.shared.policy {
                ResetPolicy::Discard => {
                    let n = state.items.len();
                    state.items.clear();
                    state.discarded += n as u64;
                    n
                }
                ResetPolicy::Keep => 0,
            };
            state.reset_pending = true;
            dropped
        };
        self.shared.wake.notify_one();
        info!(dropped, policy = %self.shared.policy, "PCI inventory reset requested");
    }

    /// Asks the worker to terminate. Idempotent.
    pub fn cancel(&self) {
        let first = {
            let mut state = self.shared.state.lock();
            !std::mem::replace(&mut state.cancel_pending, true)
        };
        self.shared.wake.notify_all();
        self.shared.drained.notify_all();
        if first {
            info!("PCI inventory queue cancelled");
        }
    }

    /// Number of device items waiting.
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().items.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.lock().cancel_pending
    }

    pub fn is_reset_pending(&self) -> bool {
        self.shared.state.lock().reset_pending
    }

    /// Device items dropped by resets so far.
    pub fn discarded(&self) -> u64 {
        self.shared.state.lock().discarded
    }

    /// Blocks until the queue is empty, no reset is pending and the worker
    /// is not processing an item.
    ///
    /// Returns false on timeout, or if the queue is cancelled with work
    /// still outstanding.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.state.lock();
        loop {
            if state.is_drained() {
                return true;
            }
            if state.cancel_pending {
                return false;
            }
            match deadline {
                Some(deadline) => {
                    if self
                        .shared
                        .drained
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return state.is_drained();
                    }
                }
                None => self.shared.drained.wait(&mut state),
            }
        }
    }

    /// Worker side: marks the previous item finished and blocks until the
    /// next unit of work.
    ///
    /// Priority: cancel, then reset, then the queue head. Returns `None` once
    /// cancelled. `on_idle` runs each time the worker is about to sleep.
    pub(crate) fn next_item(&self, mut on_idle: impl FnMut()) -> Option<WorkItem> {
        let mut state = self.shared.state.lock();
        state.busy = false;

        loop {
            if state.cancel_pending {
                self.shared.drained.notify_all();
                return None;
            }

            if state.reset_pending {
                state.reset_pending = false;
                state.busy = true;
                return Some(WorkItem::Reset);
            }

            if let Some(device) = state.items.pop_front() {
                state.busy = true;
                return Some(WorkItem::Device(device));
            }

            self.shared.drained.notify_all();
            on_idle();
            // Spurious wakeups fall through to the checks above.
            self.shared.wake.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pciinv_core::PciAddress;
    use std::thread;

    fn dev(bus: u8) -> DeviceDescriptor {
        DeviceDescriptor::new(PciAddress::new(0, bus, 0, 0), 0x8086, 0x1533, 0x020000, 3)
    }

    fn take(queue: &WorkQueue) -> Option<WorkItem> {
        queue.next_item(|| panic!("worker would block"))
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::default();
        for bus in 0..5 {
            queue.push(dev(bus));
        }
        assert_eq!(queue.len(), 5);
        for bus in 0..5 {
            assert_eq!(take(&queue), Some(WorkItem::Device(dev(bus))));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let queue = WorkQueue::default();
        queue.push(dev(1));
        queue.push(dev(1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_cancel_has_priority() {
        let queue = WorkQueue::default();
        queue.push(dev(1));
        queue.request_reset();
        queue.cancel();
        assert_eq!(take(&queue), None);
        // idempotent
        queue.cancel();
        assert!(queue.is_cancelled());
        assert_eq!(take(&queue), None);
    }

    #[test]
    fn test_reset_before_items_and_flag_cleared() {
        let queue = WorkQueue::new(ResetPolicy::Keep);
        queue.push(dev(1));
        queue.request_reset();
        assert!(queue.is_reset_pending());

        assert_eq!(take(&queue), Some(WorkItem::Reset));
        assert!(!queue.is_reset_pending());
        assert_eq!(take(&queue), Some(WorkItem::Device(dev(1))));
    }

    #[test]
    fn test_repeated_reset_requests_coalesce() {
        let queue = WorkQueue::new(ResetPolicy::Keep);
        queue.request_reset();
        queue.request_reset();
        assert_eq!(take(&queue), Some(WorkItem::Reset));
        assert!(!queue.is_reset_pending());

        queue.cancel();
        assert_eq!(take(&queue), None);
    }

    #[test]
    fn test_discard_policy_drops_queued_devices() {
        let queue = WorkQueue::new(ResetPolicy::Discard);
        queue.push(dev(1));
        queue.push(dev(2));
        queue.request_reset();
        queue.push(dev(3));

        assert_eq!(queue.discarded(), 2);
        assert_eq!(take(&queue), Some(WorkItem::Reset));
        assert_eq!(take(&queue), Some(WorkItem::Device(dev(3))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_keep_policy_retains_queued_devices() {
        let queue = WorkQueue::new(ResetPolicy::Keep);
        queue.push(dev(1));
        queue.request_reset();
        queue.push(dev(2));

        assert_eq!(queue.discarded(), 0);
        assert_eq!(take(&queue), Some(WorkItem::Reset));
        assert_eq!(take(&queue), Some(WorkItem::Device(dev(1))));
        assert_eq!(take(&queue), Some(WorkItem::Device(dev(2))));
    }

    #[test]
    fn test_idle_worker_wakes_on_push() {
        let queue = WorkQueue::default();
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.next_item(|| {}))
        };

        // Give the consumer a chance to block first; correctness does not
        // depend on it.
        thread::sleep(Duration::from_millis(20));
        queue.push(dev(7));

        assert_eq!(consumer.join().unwrap(), Some(WorkItem::Device(dev(7))));
    }

    #[test]
    fn test_idle_worker_wakes_on_cancel() {
        let queue = WorkQueue::default();
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.next_item(|| {}))
        };
        thread::sleep(Duration::from_millis(20));
        queue.cancel();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_wait_drained() {
        let queue = WorkQueue::default();
        assert!(queue.wait_drained(Duration::from_millis(0)));

        queue.push(dev(1));
        assert!(!queue.wait_drained(Duration::from_millis(10)));

        // Popped but not finished: still busy.
        assert!(take(&queue).is_some());
        assert!(!queue.wait_drained(Duration::from_millis(10)));

        let finisher = {
            let queue = queue.clone();
            thread::spawn(move || queue.next_item(|| {}))
        };
        assert!(queue.wait_drained(Duration::from_secs(5)));

        queue.cancel();
        assert_eq!(finisher.join().unwrap(), None);
    }

    #[test]
    fn test_wait_drained_with_unbounded_timeout() {
        let queue = WorkQueue::default();
        assert!(queue.wait_drained(Duration::MAX));

        queue.push(dev(1));
        let waiter = {
            let queue = queue.clone();
            thread::spawn(move || queue.wait_drained(Duration::MAX))
        };
        thread::sleep(Duration::from_millis(20));
        queue.cancel();
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn test_wait_drained_returns_on_cancel() {
        let queue = WorkQueue::default();
        queue.push(dev(1));
        let waiter = {
            let queue = queue.clone();
            thread::spawn(move || queue.wait_drained(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(20));
        queue.cancel();
        assert!(!waiter.join().unwrap());
    }
}
