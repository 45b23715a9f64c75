//! # Inventory Sync
//!
//! Turns device descriptors into inventory upserts and implements the reset
//! protocol.
//!
//! ## Reset Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        reset()                                          │
//! │                                                                         │
//! │  1. Enumerate: every object under the inventory root that carries      │
//! │                the PCI interface                                       │
//! │        │                                                                │
//! │        ├── failure ──► abandon this cycle (Transport error)            │
//! │        ▼                                                                │
//! │  2. For each path: strip the root, upsert an ABSENT record             │
//! │        Present = false, every string property = ""                     │
//! │        │                                                                │
//! │        └── single failure ──► log, count, continue                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Objects cannot be deleted from the inventory, so "removal" is a write of
//! an empty description.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use pciinv_core::hex::{hex16, hex24, hex8};
use pciinv_core::DeviceDescriptor;

use crate::config::InventorySettings;
use crate::error::InventoryResult;
use crate::store::{InventoryObject, InventoryStore, Interfaces, Properties, PropertyValue};

// =============================================================================
// Property Names
// =============================================================================

/// `xyz.openbmc_project.Inventory.Item`
pub const PROP_PRESENT: &str = "Present";
pub const PROP_PRETTY_NAME: &str = "PrettyName";

/// `xyz.openbmc_project.Inventory.Item.PCI`
pub const PROP_LOCATION: &str = "Location";
pub const PROP_DEVICE_ID: &str = "DeviceID";
pub const PROP_VENDOR_ID: &str = "VendorID";
pub const PROP_REVISION: &str = "Revision";
pub const PROP_CLASS_CODE: &str = "ClassCode";

// =============================================================================
// Inventory Record
// =============================================================================

/// Typed view of one PCI inventory object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryRecord {
    pub present: bool,
    pub pretty_name: String,
    pub location: String,
    pub device_id: String,
    pub vendor_id: String,
    pub revision: String,
    pub class_code: String,
}

impl InventoryRecord {
    /// Record describing a present device.
    pub fn from_device(dev: &DeviceDescriptor) -> Self {
        InventoryRecord {
            present: true,
            pretty_name: dev.label().to_string(),
            location: dev.location().to_string(),
            device_id: hex16(dev.device_id()),
            vendor_id: hex16(dev.vendor_id()),
            revision: hex8(dev.revision()),
            class_code: hex24(dev.class_code()),
        }
    }

    /// Soft-deleted record: not present, every field empty.
    pub fn absent() -> Self {
        InventoryRecord::default()
    }

    /// Splits the record into the two inventory interfaces.
    pub fn to_interfaces(&self, settings: &InventorySettings) -> Interfaces {
        let item: Properties = [
            (PROP_PRESENT, PropertyValue::from(self.present)),
            (PROP_PRETTY_NAME, self.pretty_name.as_str().into()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let pci: Properties = [
            (PROP_LOCATION, &self.location),
            (PROP_DEVICE_ID, &self.device_id),
            (PROP_VENDOR_ID, &self.vendor_id),
            (PROP_REVISION, &self.revision),
            (PROP_CLASS_CODE, &self.class_code),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), PropertyValue::from(v.as_str())))
        .collect();

        Interfaces::from([
            (settings.item_interface.clone(), item),
            (settings.pci_interface.clone(), pci),
        ])
    }

    /// Reads a record back from stored interfaces. Missing properties read as
    /// empty / not present.
    pub fn from_interfaces(ifaces: &Interfaces, settings: &InventorySettings) -> Self {
        let item = ifaces.get(&settings.item_interface);
        let pci = ifaces.get(&settings.pci_interface);

        let text = |props: Option<&Properties>, name: &str| {
            props
                .and_then(|p| p.get(name))
                .and_then(PropertyValue::as_str)
                .unwrap_or_default()
                .to_string()
        };

        InventoryRecord {
            present: item
                .and_then(|p| p.get(PROP_PRESENT))
                .and_then(PropertyValue::as_bool)
                .unwrap_or(false),
            pretty_name: text(item, PROP_PRETTY_NAME),
            location: text(pci, PROP_LOCATION),
            device_id: text(pci, PROP_DEVICE_ID),
            vendor_id: text(pci, PROP_VENDOR_ID),
            revision: text(pci, PROP_REVISION),
            class_code: text(pci, PROP_CLASS_CODE),
        }
    }
}

// =============================================================================
// Reset Summary
// =============================================================================

/// Outcome of one reset cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Paths returned by enumeration.
    pub enumerated: usize,
    /// Objects successfully written as absent.
    pub cleared: usize,
    /// Objects whose upsert failed.
    pub failed: usize,
    /// Paths outside the inventory root, left untouched.
    pub skipped: usize,
}

// =============================================================================
// Inventory Sync
// =============================================================================

/// Writes PCI device descriptions into the inventory store.
pub struct InventorySync {
    store: Arc<dyn InventoryStore>,
    settings: InventorySettings,
}

impl InventorySync {
    pub fn new(store: Arc<dyn InventoryStore>, settings: InventorySettings) -> Self {
        InventorySync { store, settings }
    }

    pub fn settings(&self) -> &InventorySettings {
        &self.settings
    }

    /// Object path (relative to the inventory root) for a descriptor.
    pub fn object_path(&self, dev: &DeviceDescriptor) -> String {
        self.settings.object_path(dev.key())
    }

    /// Marks every PCI object currently in the inventory as absent.
    ///
    /// Fails only if enumeration fails; individual write failures are
    /// counted in the summary.
    pub fn reset(&self) -> InventoryResult<ResetSummary> {
        info!("Reset PCI inventory");

        let paths = self
            .store
            .enumerate(&self.settings.root, &[self.settings.pci_interface.as_str()])?;

        let mut summary = ResetSummary {
            enumerated: paths.len(),
            ..Default::default()
        };

        let absent = InventoryRecord::absent().to_interfaces(&self.settings);
        for full_path in paths {
            let Some(path) = self.relative_path(&full_path) else {
                warn!(path = %full_path, "Enumerated path outside inventory root, skipping");
                summary.skipped += 1;
                continue;
            };

            let object = InventoryObject {
                path: path.to_string(),
                interfaces: absent.clone(),
            };

            match self.store.upsert(&object) {
                Ok(()) => {
                    debug!(path = %path, "PCI inventory object cleared");
                    summary.cleared += 1;
                }
                Err(e) => {
                    error!(?e, path = %path, "Failed to clear PCI inventory object");
                    summary.failed += 1;
                }
            }
        }

        info!(
            enumerated = summary.enumerated,
            cleared = summary.cleared,
            failed = summary.failed,
            skipped = summary.skipped,
            "PCI inventory reset complete"
        );
        Ok(summary)
    }

    /// Strips the inventory root from an enumerated path. Only whole path
    /// segments match: `{root}foo/...` is not under `{root}`.
    fn relative_path<'a>(&self, full_path: &'a str) -> Option<&'a str> {
        full_path
            .strip_prefix(self.settings.root.as_str())
            .filter(|rest| rest.starts_with('/'))
    }

    /// Writes one device as present. No retry on failure.
    pub fn add(&self, dev: &DeviceDescriptor) -> InventoryResult<()> {
        let object = InventoryObject {
            path: self.object_path(dev),
            interfaces: InventoryRecord::from_device(dev).to_interfaces(&self.settings),
        };

        self.store.upsert(&object)?;

        debug!(
            key = %dev.key(),
            location = %dev.location(),
            label = dev.label(),
            "PCI device written to inventory"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
