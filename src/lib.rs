//! Resilient WebSocket - a self-healing persistent WebSocket client.
//!
//! This library wraps a message-oriented duplex socket and transparently
//! re-establishes it with exponential backoff when it drops, while the
//! caller keeps one stable send/receive handle.
//!
//! # Architecture
//!
//! - **Handle**: [`ResilientConnection`] posts commands and answers queries
//! - **Supervisor**: one tokio task owns the state machine, the attempt
//!   counter, the live transport and the single retry timer
//! - **Transport**: a [`Connector`](transport::Connector) creates one
//!   socket per attempt; the default is tokio-tungstenite
//!
//! Key design principles:
//!
//! - At most one live transport and one pending retry at any time
//! - The attempt counter resets only on a successful open
//! - Sends are at-most-once: nothing is queued across reconnects
//! - A caller's `close()` is terminal
//!
//! # Quick Start
//!
//! ```no_run
//! use resilient_ws::{Callbacks, ResilientConnection, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let conn = ResilientConnection::builder("ws://127.0.0.1:8000/chats/123")
//!         .max_reconnect_attempts(10)
//!         .backoff_multiplier(2.0)
//!         .handler(
//!             Callbacks::new()
//!                 .on_open(|| println!("Connected"))
//!                 .on_message(|payload| println!("Received: {payload}"))
//!                 .on_max_attempts_reached(|| eprintln!("Giving up")),
//!         )
//!         .connect()?;
//!
//!     conn.send("hello");
//!     conn.close();
//!     conn.closed().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | [`ResilientConnection`], builder, options, events |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | [`Payload`] and [`CloseInfo`] |
//! | [`transport`] | Connector trait and WebSocket transport |

// ============================================================================
// Modules
// ============================================================================

/// Self-healing connection.
///
/// - [`ResilientConnection`] - Connection handle
/// - [`ConnectionBuilder`] - Configuration builder
/// - [`EventHandler`] - Event observer
pub mod connection;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Message payload and close types.
pub mod protocol;

/// Transport layer.
///
/// Defines the socket primitive the connection consumes, plus the
/// tokio-tungstenite implementation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{
    Callback, Callbacks, ConnectionBuilder, ConnectionEvent, ConnectionState, EventHandler,
    ReconnectOptions, ResilientConnection,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, Generation};

// Protocol types
pub use protocol::{CloseInfo, Payload};

// Transport types
pub use transport::{Connector, WsConnector};
