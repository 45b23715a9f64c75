//! # Inventory Error Types
//!
//! Error types for the ingestion pipeline.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Ingress             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  Decode                 │ │
//! │  │  ConfigLoad     │  │  (store call    │  │  (bad OEM payload)      │ │
//! │  │  ConfigSave     │  │   failed)       │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Internal: UnexpectedFault, WorkerSpawn                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport and unexpected faults never escape the worker thread: the loop
//! logs them and moves on to the next item.

use thiserror::Error;

use pciinv_core::DecodeError;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Error type covering all pipeline failures.
#[derive(Debug, Error)]
pub enum InventoryError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration.
    #[error("Invalid inventory configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// A call to the inventory store failed.
    #[error("Inventory {operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    // =========================================================================
    // Ingress Errors
    // =========================================================================
    /// Malformed OEM payload.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Any other failure while processing a single work item.
    #[error("Unexpected fault: {0}")]
    UnexpectedFault(String),

    /// The worker thread could not be created.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

impl InventoryError {
    /// Builds a transport error for the named store operation.
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        InventoryError::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Returns true if a store call failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, InventoryError::Transport { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            InventoryError::InvalidConfig(_)
                | InventoryError::ConfigLoadFailed(_)
                | InventoryError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        InventoryError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for InventoryError {
    fn from(err: toml::de::Error) -> Self {
        InventoryError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for InventoryError {
    fn from(err: toml::ser::Error) -> Self {
        InventoryError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(InventoryError::transport("upsert", "bus down").is_transport());
        assert!(!InventoryError::UnexpectedFault("boom".into()).is_transport());

        assert!(InventoryError::InvalidConfig("x".into()).is_config_error());
        assert!(!InventoryError::transport("enumerate", "x").is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = InventoryError::transport("enumerate", "no such service");
        assert_eq!(
            err.to_string(),
            "Inventory enumerate failed: no such service"
        );
    }

    #[test]
    fn test_decode_conversion() {
        let err: InventoryError = DecodeError::InvalidLength {
            expected: 15,
            actual: 1,
        }
        .into();
        assert!(matches!(err, InventoryError::Decode(_)));
    }
}
