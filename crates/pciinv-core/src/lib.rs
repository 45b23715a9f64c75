//! # pciinv-core: Pure PCI Device Types
//!
//! Value types shared by the PCI inventory pipeline. Everything here is a
//! pure function of its inputs: no I/O, no threads, no clocks.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PCI Inventory Data Flow                          │
//! │                                                                         │
//! │  Host firmware ──► IPMI OEM message (15 bytes, big-endian)             │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pciinv-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   wire    │  │  device   │  │   class   │  │    hex    │  │   │
//! │  │   │  decode   │─►│Descriptor │─►│  labels   │  │  format   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             pciinv-sync (queue, worker, inventory)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`device`] - `PciAddress` and `DeviceDescriptor`
//! - [`class`] - Class code → human-readable label
//! - [`hex`] - Fixed-width hexadecimal formatting for inventory fields
//! - [`wire`] - Bounds-checked decode of the IPMI OEM payload
//! - [`error`] - Decode error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pciinv_core::{DeviceDescriptor, PciAddress};
//!
//! let dev = DeviceDescriptor::new(
//!     PciAddress::new(0, 0, 0x1f, 0),
//!     0x8086,
//!     0xa1b2,
//!     0x060100,
//!     0x03,
//! );
//!
//! assert_eq!(dev.key(), "PCI0000001f0");
//! assert_eq!(dev.location(), "0000:00:1f.0");
//! assert_eq!(dev.label(), "ISA bridge");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod class;
pub mod device;
pub mod error;
pub mod hex;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use class::class_label;
pub use device::{DeviceDescriptor, PciAddress};
pub use error::DecodeError;
pub use wire::{PciMessage, DEVICE_RECORD_LEN, MESSAGE_LEN};

/// Mask for the significant bits of a PCI class code.
pub const CLASS_CODE_MASK: u32 = 0x00ff_ffff;
