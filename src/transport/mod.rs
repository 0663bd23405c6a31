//! Transport layer.
//!
//! A transport is one attempt at a duplex message socket. The connection
//! supervisor creates a new transport for every (re)connect and drops the
//! old one; transports are never reused.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   TransportCommand    ┌──────────────────────┐
//! │  Supervisor          │──────────────────────►│  Transport task      │
//! │  (TransportHandle)   │                       │  (TransportLink)     │
//! │                      │◄──────────────────────│  WebSocket I/O       │
//! └──────────────────────┘   TransportEvent      └──────────────────────┘
//! ```
//!
//! # Transport Lifecycle
//!
//! 1. `Connector::connect` - Returns a handle immediately, connects in background
//! 2. `TransportEvent::Opened` - Socket established
//! 3. `TransportEvent::Message` / `TransportEvent::Error` - Traffic and failures
//! 4. `TransportEvent::Closed` - Always the last event of a transport
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handle` | `Connector` trait and the handle/link channel pair |
//! | `websocket` | tokio-tungstenite implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Connector trait and transport channel types.
pub mod handle;

/// WebSocket transport backed by tokio-tungstenite.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use handle::{Connector, TransportCommand, TransportEvent, TransportHandle, TransportLink};
pub use websocket::WsConnector;
