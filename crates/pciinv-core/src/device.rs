//! # Device Types
//!
//! The PCI device description carried by each inbound OEM message.
//!
//! ## Identity vs. Attributes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DeviceDescriptor                                 │
//! │                                                                         │
//! │  ┌──────────────────────────┐   ┌──────────────────────────────────┐   │
//! │  │ PciAddress (identity)    │   │ Attributes                       │   │
//! │  │  domain   u16            │   │  vendor_id   u16                 │   │
//! │  │  bus      u8             │   │  device_id   u16                 │   │
//! │  │  device   u8             │   │  class_code  u32 (24 bits)       │   │
//! │  │  function u8             │   │  revision    u8                  │   │
//! │  └────────────┬─────────────┘   └───────────────┬──────────────────┘   │
//! │               │                                 │                       │
//! │               ▼                                 ▼                       │
//! │   key      "PCI0000001f0"             label  "ISA bridge"              │
//! │   location "0000:00:1f.0"                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The key depends on the address only: two descriptors at the same BDF
//! always land on the same inventory object, whatever they claim to be.

use serde::Serialize;
use std::fmt;

use crate::class::class_label;
use crate::CLASS_CODE_MASK;

// =============================================================================
// PCI Address
// =============================================================================

/// Domain/bus/device/function address of a PCI function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PciAddress {
    pub domain: u16,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    #[inline]
    pub const fn new(domain: u16, bus: u8, device: u8, function: u8) -> Self {
        PciAddress {
            domain,
            bus,
            device,
            function,
        }
    }

    /// Short unique name used as the inventory object name.
    pub fn key(&self) -> String {
        format!(
            "PCI{:04x}{:02x}{:02x}{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }

    /// Conventional `dddd:bb:dd.f` location string.
    pub fn location(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

// =============================================================================
// Device Descriptor
// =============================================================================

/// Normalized PCI device description.
///
/// All numeric fields are host-native. Derived strings are computed once in
/// [`DeviceDescriptor::new`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    address: PciAddress,
    vendor_id: u16,
    device_id: u16,
    class_code: u32,
    revision: u8,

    key: String,
    location: String,
    label: &'static str,
}

impl DeviceDescriptor {
    /// Creates a descriptor from host-native values.
    ///
    /// Bits of `class_code` above the low 24 are discarded.
    pub fn new(
        address: PciAddress,
        vendor_id: u16,
        device_id: u16,
        class_code: u32,
        revision: u8,
    ) -> Self {
        let class_code = class_code & CLASS_CODE_MASK;
        DeviceDescriptor {
            key: address.key(),
            location: address.location(),
            label: class_label(class_code),
            address,
            vendor_id,
            device_id,
            class_code,
            revision,
        }
    }

    #[inline]
    pub fn address(&self) -> PciAddress {
        self.address
    }

    #[inline]
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    #[inline]
    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// 24-bit class code (class, subclass, programming interface).
    #[inline]
    pub fn class_code(&self) -> u32 {
        self.class_code
    }

    #[inline]
    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// Stable inventory key, derived from the address only.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Classification label, e.g. `"Ethernet controller"`.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}] {}",
            self.location, self.vendor_id, self.device_id, self.label
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
