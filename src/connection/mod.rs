//! Self-healing connection.
//!
//! This module provides [`ResilientConnection`], the only stateful
//! component of the crate.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResilientConnection`] | Handle: send, close, reconnect, queries |
//! | [`ConnectionBuilder`] | Fluent configuration builder |
//! | [`ReconnectOptions`] | Attempt limit and backoff parameters |
//! | [`ConnectionState`] | Lifecycle state |
//! | [`EventHandler`] | Observer of connection events |
//!
//! # Example
//!
//! ```no_run
//! use resilient_ws::{ConnectionEvent, ResilientConnection, Result};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<()> {
//! let (events_tx, mut events) = mpsc::unbounded_channel::<ConnectionEvent>();
//! let conn = ResilientConnection::builder("ws://127.0.0.1:8000/chats/123")
//!     .max_reconnect_attempts(10)
//!     .handler(events_tx)
//!     .connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     if let ConnectionEvent::Opened = event {
//!         conn.send("hello");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for connection configuration.
pub mod builder;

/// Connection handle.
pub mod core;

/// Event handler trait and implementations.
pub mod handler;

/// Reconnect options and backoff.
pub mod options;

/// Connection states.
pub mod state;

/// Supervisor task owning all connection state.
mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use self::core::ResilientConnection;
pub use handler::{Callback, Callbacks, ConnectionEvent, EventHandler};
pub use options::ReconnectOptions;
pub use state::ConnectionState;
