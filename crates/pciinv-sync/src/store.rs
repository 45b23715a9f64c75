//! # Inventory Store
//!
//! The request/response seam to the hardware inventory, plus an in-memory
//! implementation.
//!
//! ## Object Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  path: /system/chassis/motherboard/PCI0000001f0                         │
//! │                                                                         │
//! │  xyz.openbmc_project.Inventory.Item                                     │
//! │    Present     = true                                                   │
//! │    PrettyName  = "ISA bridge"                                           │
//! │                                                                         │
//! │  xyz.openbmc_project.Inventory.Item.PCI                                 │
//! │    Location    = "0000:00:1f.0"                                         │
//! │    DeviceID    = "0xa1b2"                                               │
//! │    VendorID    = "0x8086"                                               │
//! │    Revision    = "0x03"                                                 │
//! │    ClassCode   = "0x060100"                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store has no delete primitive. Upserts merge property-by-property
//! into whatever the object already holds.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// Object Types
// =============================================================================

/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Str(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            PropertyValue::Bool(_) => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

/// Property name → value.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Interface name → properties.
pub type Interfaces = BTreeMap<String, Properties>;

/// One object to write: a path relative to the inventory root and the
/// interfaces to merge into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryObject {
    pub path: String,
    pub interfaces: Interfaces,
}

// =============================================================================
// Store Trait
// =============================================================================

/// Request/response interface to the inventory service.
///
/// Every call is made from the worker thread; implementations only need to
/// be `Send + Sync` so they can be shared with whoever owns the store.
pub trait InventoryStore: Send + Sync {
    /// Returns absolute paths of objects under `root` that implement any of
    /// `interfaces`.
    fn enumerate(&self, root: &str, interfaces: &[&str]) -> InventoryResult<Vec<String>>;

    /// Creates or merges `object` into the inventory.
    fn upsert(&self, object: &InventoryObject) -> InventoryResult<()>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Inventory kept in process memory.
///
/// Object paths are stored relative to `root`, exactly as written by
/// [`InventoryStore::upsert`]; [`InventoryStore::enumerate`] reports them as
/// absolute paths.
#[derive(Debug)]
pub struct MemoryInventory {
    root: String,
    objects: Mutex<BTreeMap<String, Interfaces>>,
}

impl MemoryInventory {
    pub fn new(root: impl Into<String>) -> Self {
        MemoryInventory {
            root: root.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns a copy of one object's interfaces.
    pub fn object(&self, path: &str) -> Option<Interfaces> {
        self.objects.lock().get(path).cloned()
    }

    /// Returns a copy of every object, ordered by path.
    pub fn snapshot(&self) -> BTreeMap<String, Interfaces> {
        self.objects.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl InventoryStore for MemoryInventory {
    fn enumerate(&self, root: &str, interfaces: &[&str]) -> InventoryResult<Vec<String>> {
        // Paths outside our own root simply do not exist here.
        let Some(relative_root) = root.strip_prefix(self.root.as_str()) else {
            return Ok(Vec::new());
        };

        let objects = self.objects.lock();
        let paths = objects
            .iter()
            .filter(|(path, _)| path.starts_with(relative_root))
            .filter(|(_, ifaces)| interfaces.iter().any(|name| ifaces.contains_key(*name)))
            .map(|(path, _)| format!("{}{}", self.root, path))
            .collect();
        Ok(paths)
    }

    fn upsert(&self, object: &InventoryObject) -> InventoryResult<()> {
        if !object.path.starts_with('/') {
            return Err(InventoryError::transport(
                "upsert",
                format!("invalid object path '{}'", object.path),
            ));
        }

        let mut objects = self.objects.lock();
        let existing = objects.entry(object.path.clone()).or_default();
        for (iface, props) in &object.interfaces {
            let target = existing.entry(iface.clone()).or_default();
            for (name, value) in props {
                target.insert(name.clone(), value.clone());
            }
        }

        debug!(path = %object.path, "Inventory object upserted");
        Ok(())
    }
}
