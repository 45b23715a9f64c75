//! # IPMI Ingress
//!
//! OEM command handler through which host firmware reports PCI devices.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Host firmware                                                          │
//! │     │  NetFn 0x2e / Cmd 0x2a / IANA 49769   (15-byte payload)          │
//! │     ▼                                                                   │
//! │  OemRouter ──► PciInventoryHandler::handle()                           │
//! │                   │                                                     │
//! │                   ├── len != 15 ──► 0xC7, nothing queued               │
//! │                   ├── reset flag ──► queue.request_reset()             │
//! │                   └── always ──────► queue.push(device)                │
//! │                                                                         │
//! │                   ◄── 0x00 (before any inventory write happens)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The handler never blocks on the worker and never touches the inventory.

use std::fmt;
use tracing::{debug, info, warn};

use pciinv_core::{DecodeError, PciMessage};

use crate::queue::WorkQueue;

// =============================================================================
// Command Identity
// =============================================================================

/// OEM group network function.
pub const PCIINV_IPMI_NETFN: u8 = 0x2e;

/// PCI device report command.
pub const PCIINV_IPMI_CMD: u8 = 0x2a;

/// IANA enterprise number the command is registered under.
pub const PCIINV_IANA: u32 = 49769;

/// Minimum session privilege for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Privilege {
    Callback,
    User,
    Operator,
    Admin,
}

/// Routing key for one OEM command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OemCommand {
    pub netfn: u8,
    pub cmd: u8,
    pub iana: u32,
    pub privilege: Privilege,
}

impl OemCommand {
    /// The PCI device report command.
    pub const PCI_INVENTORY: OemCommand = OemCommand {
        netfn: PCIINV_IPMI_NETFN,
        cmd: PCIINV_IPMI_CMD,
        iana: PCIINV_IANA,
        privilege: Privilege::Admin,
    };
}

/// IPMI completion code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletionCode(pub u8);

impl CompletionCode {
    pub const SUCCESS: CompletionCode = CompletionCode(0x00);
    pub const INVALID_LENGTH: CompletionCode = CompletionCode(0xC7);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for CompletionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl From<&DecodeError> for CompletionCode {
    fn from(err: &DecodeError) -> Self {
        match err {
            DecodeError::InvalidLength { .. } => CompletionCode::INVALID_LENGTH,
        }
    }
}

// =============================================================================
// Router Trait
// =============================================================================

/// Boxed OEM command handler.
pub type OemHandler = Box<dyn Fn(&[u8]) -> CompletionCode + Send + Sync>;

/// Registration surface of the IPMI daemon's OEM dispatcher.
pub trait OemRouter {
    fn register_oem(&mut self, command: OemCommand, handler: OemHandler);
}

// =============================================================================
// Handler
// =============================================================================

/// Producer side of the pipeline.
#[derive(Debug, Clone)]
pub struct PciInventoryHandler {
    queue: WorkQueue,
}

impl PciInventoryHandler {
    pub fn new(queue: WorkQueue) -> Self {
        PciInventoryHandler { queue }
    }

    /// Handles one request payload.
    pub fn handle(&self, payload: &[u8]) -> CompletionCode {
        let message = match PciMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(%e, len = payload.len(), "Rejecting PCI inventory request");
                return CompletionCode::from(&e);
            }
        };

        debug!(
            reset = message.reset,
            key = %message.device.key(),
            "PCI inventory request accepted"
        );

        if message.reset {
            self.queue.request_reset();
        }
        self.queue.push(message.device);

        CompletionCode::SUCCESS
    }
}

/// Registers the PCI inventory command with `router`, feeding `queue`.
pub fn register_pci_inventory_handler<R: OemRouter + ?Sized>(router: &mut R, queue: WorkQueue) {
    info!(
        netfn = PCIINV_IPMI_NETFN,
        cmd = PCIINV_IPMI_CMD,
        iana = PCIINV_IANA,
        "Registering PCI inventory handler"
    );

    let handler = PciInventoryHandler::new(queue);
    router.register_oem(
        OemCommand::PCI_INVENTORY,
        Box::new(move |payload| handler.handle(payload)),
    );
}
