//! Error types for the resilient WebSocket client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Construction is the only fallible call that returns [`Result<T>`]. Errors
//! that happen while the connection is running are delivered to
//! [`EventHandler::on_error`](crate::EventHandler::on_error) instead:
//!
//! ```ignore
//! use resilient_ws::{ResilientConnection, Result};
//!
//! async fn example() -> Result<()> {
//!     let conn = ResilientConnection::builder("ws://127.0.0.1:8000/chats/123")
//!         .backoff_multiplier(2.0)
//!         .connect()?;
//!     conn.send("hello");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Connection | [`Error::Connection`], [`Error::NotOpen`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::connection::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when reconnect options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint could not be used as a WebSocket URL.
    ///
    /// Reported asynchronously when a transport attempt starts.
    #[error("Invalid endpoint {endpoint}: {message}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport failure that is not a WebSocket protocol error.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Data was submitted while the connection was not open.
    ///
    /// The data is dropped; nothing is queued or retried.
    #[error("Connection is not open (state: {state})")]
    NotOpen {
        /// State at the time of the send.
        state: ConnectionState,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON error (options parsing).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid endpoint error.
    #[inline]
    pub fn invalid_endpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a not-open error for the given state.
    #[inline]
    pub fn not_open(state: ConnectionState) -> Self {
        Self::NotOpen { state }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a configuration error.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidEndpoint { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
