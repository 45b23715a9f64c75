//! # Inventory Configuration
//!
//! Configuration management for the ingestion pipeline.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PCIINV_RESET_POLICY=keep                                           │
//! │     PCIINV_INVENTORY_ROOT=/xyz/openbmc_project/inventory               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pciinv/inventory.toml (Linux)                            │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     OpenBMC inventory paths, ResetPolicy::Discard                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # inventory.toml
//! [inventory]
//! root = "/xyz/openbmc_project/inventory"
//! pci_root = "/system/chassis/motherboard/"
//! item_interface = "xyz.openbmc_project.Inventory.Item"
//! pci_interface = "xyz.openbmc_project.Inventory.Item.PCI"
//!
//! [queue]
//! reset_policy = "discard"  # discard | keep
//!
//! [worker]
//! thread_name = "pciinv-worker"
//! shutdown_drain_secs = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// Reset Policy
// =============================================================================

/// What a reset request does with device items already waiting in the queue.
///
/// ```text
/// queue: [A, B]   request_reset()   push(C)
///
///   DISCARD (default)                 KEEP
///   ─────────────────                 ────
///   queue: [C]                        queue: [A, B, C]
///   worker: reset, C                  worker: reset, A, B, C
/// ```
///
/// A reset opens a new reporting session on the host side, so devices queued
/// from the previous session are stale by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Drop queued device items when a reset is requested.
    #[default]
    Discard,

    /// Leave queued device items; they apply after the reset completes.
    Keep,
}

impl std::fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetPolicy::Discard => write!(f, "discard"),
            ResetPolicy::Keep => write!(f, "keep"),
        }
    }
}

impl std::str::FromStr for ResetPolicy {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discard" | "drop" => Ok(ResetPolicy::Discard),
            "keep" | "apply" => Ok(ResetPolicy::Keep),
            other => Err(InventoryError::InvalidConfig(format!(
                "Unknown reset policy: '{}'. Valid options: discard, keep",
                other
            ))),
        }
    }
}

// =============================================================================
// Inventory Settings
// =============================================================================

/// Where and how PCI devices are written in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Inventory root; enumeration returns paths under it.
    #[serde(default = "default_root")]
    pub root: String,

    /// Prefix for PCI objects, relative to `root`.
    #[serde(default = "default_pci_root")]
    pub pci_root: String,

    /// Common inventory item interface (`Present`, `PrettyName`).
    #[serde(default = "default_item_interface")]
    pub item_interface: String,

    /// PCI-specific interface; also the enumeration filter for reset.
    #[serde(default = "default_pci_interface")]
    pub pci_interface: String,
}

fn default_root() -> String {
    "/xyz/openbmc_project/inventory".to_string()
}

fn default_pci_root() -> String {
    "/system/chassis/motherboard/".to_string()
}

fn default_item_interface() -> String {
    "xyz.openbmc_project.Inventory.Item".to_string()
}

fn default_pci_interface() -> String {
    "xyz.openbmc_project.Inventory.Item.PCI".to_string()
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            root: default_root(),
            pci_root: default_pci_root(),
            item_interface: default_item_interface(),
            pci_interface: default_pci_interface(),
        }
    }
}

impl InventorySettings {
    /// Object path (relative to `root`) for a device key.
    pub fn object_path(&self, key: &str) -> String {
        format!("{}{}", self.pci_root, key)
    }
}

// =============================================================================
// Queue Settings
// =============================================================================

/// Work queue behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default)]
    pub reset_policy: ResetPolicy,
}

// =============================================================================
// Worker Settings
// =============================================================================

/// Worker thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// OS thread name of the worker.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// How long an orderly shutdown waits for queued items before cancelling.
    /// 0 cancels immediately.
    #[serde(default = "default_shutdown_drain")]
    pub shutdown_drain_secs: u64,
}

fn default_thread_name() -> String {
    "pciinv-worker".to_string()
}

fn default_shutdown_drain() -> u64 {
    5
}

impl Default for WorkerSettings {
    fn default() -> Self {
        WorkerSettings {
            thread_name: default_thread_name(),
            shutdown_drain_secs: default_shutdown_drain(),
        }
    }
}

impl WorkerSettings {
    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_secs)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default)]
    pub worker: WorkerSettings,
}

impl InventoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (inventory.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> InventoryResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading inventory config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load inventory config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> InventoryResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| InventoryError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| InventoryError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| InventoryError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Inventory config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> InventoryResult<()> {
        let inv = &self.inventory;

        if !inv.root.starts_with('/') || inv.root.len() < 2 || inv.root.ends_with('/') {
            return Err(InventoryError::InvalidConfig(format!(
                "inventory root must be an absolute path without trailing '/', got: {}",
                inv.root
            )));
        }

        if !inv.pci_root.starts_with('/') || !inv.pci_root.ends_with('/') {
            return Err(InventoryError::InvalidConfig(format!(
                "pci_root must start and end with '/', got: {}",
                inv.pci_root
            )));
        }

        if inv.item_interface.is_empty() || inv.pci_interface.is_empty() {
            return Err(InventoryError::InvalidConfig(
                "inventory interface names must not be empty".into(),
            ));
        }

        if self.worker.thread_name.is_empty() {
            return Err(InventoryError::InvalidConfig(
                "worker thread_name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("PCIINV_INVENTORY_ROOT") {
            debug!(root = %root, "Overriding inventory root from environment");
            self.inventory.root = root;
        }

        if let Ok(pci_root) = std::env::var("PCIINV_PCI_ROOT") {
            debug!(pci_root = %pci_root, "Overriding PCI root from environment");
            self.inventory.pci_root = pci_root;
        }

        if let Ok(policy) = std::env::var("PCIINV_RESET_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding reset policy from environment");
                    self.queue.reset_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown reset policy in environment"),
            }
        }

        if let Ok(name) = std::env::var("PCIINV_WORKER_THREAD") {
            self.worker.thread_name = name;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "openbmc", "pciinv")
            .map(|dirs| dirs.config_dir().join("inventory.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_policy_parsing() {
        assert_eq!("discard".parse::<ResetPolicy>().unwrap(), ResetPolicy::Discard);
        assert_eq!("DROP".parse::<ResetPolicy>().unwrap(), ResetPolicy::Discard);
        assert_eq!("keep".parse::<ResetPolicy>().unwrap(), ResetPolicy::Keep);
        assert!("sometimes".parse::<ResetPolicy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = InventoryConfig::default();
        assert_eq!(config.inventory.root, "/xyz/openbmc_project/inventory");
        assert_eq!(config.queue.reset_policy, ResetPolicy::Discard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_object_path() {
        let settings = InventorySettings::default();
        assert_eq!(
            settings.object_path("PCI0000001f0"),
            "/system/chassis/motherboard/PCI0000001f0"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = InventoryConfig::default();

        config.inventory.root = "relative/path".into();
        assert!(config.validate().is_err());

        config.inventory.root = "/xyz/openbmc_project/inventory/".into();
        assert!(config.validate().is_err());

        config.inventory.root = "/inv".into();
        config.inventory.pci_root = "/system".into();
        assert!(config.validate().is_err());

        config.inventory.pci_root = "/system/".into();
        assert!(config.validate().is_ok());

        config.worker.thread_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: InventoryConfig = toml::from_str(
            r#"
            [queue]
            reset_policy = "keep"
            "#,
        )
        .unwrap();
        assert_eq!(config.queue.reset_policy, ResetPolicy::Keep);
        assert_eq!(config.inventory, InventorySettings::default());
        assert_eq!(config.worker.shutdown_drain_secs, 5);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("inventory.toml");

        let mut config = InventoryConfig::default();
        config.inventory.pci_root = "/system/board/".into();
        config.worker.thread_name = "pci-test".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[inventory]"));
        assert!(contents.contains("[queue]"));

        let loaded: InventoryConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.toml");
        std::fs::write(&path, "[queue]\nreset_policy = \"sometimes\"\n").unwrap();

        let config = InventoryConfig::load_or_default(Some(path));
        assert_eq!(config, InventoryConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.toml");
        std::fs::write(&path, "[inventory]\nroot = \"no-slash\"\n").unwrap();

        let err = InventoryConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }
}
