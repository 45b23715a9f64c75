//! # Error Types
//!
//! Error types for pciinv-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pciinv-core errors (this file)                                        │
//! │  └── DecodeError      - Malformed IPMI payloads                        │
//! │                                                                         │
//! │  pciinv-sync errors (separate crate)                                   │
//! │  └── InventoryError   - Store, config and worker failures              │
//! │                                                                         │
//! │  Flow: DecodeError → IPMI completion code (never reaches the queue)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Decode Error
// =============================================================================

/// Failures while decoding an inbound OEM payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload length does not match the packed message layout.
    ///
    /// ## When This Occurs
    /// - Host firmware speaks a different revision of the OEM command
    /// - The IPMI stack truncated the request
    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
