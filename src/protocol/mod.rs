//! Message types carried by the connection.
//!
//! The connection does not own a wire format: payloads are opaque text or
//! binary data handed through unmodified.
//!
//! # Types
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Payload`] | Both | Message data (text or binary) |
//! | [`CloseInfo`] | Both | Close code and reason |

// ============================================================================
// Submodules
// ============================================================================

/// Payload and close frame types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{CloseInfo, Payload};
