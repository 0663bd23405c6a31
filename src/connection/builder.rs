//! Builder pattern for connection configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use resilient_ws::{Callbacks, ResilientConnection};
//!
//! # async fn example() -> resilient_ws::Result<()> {
//! let conn = ResilientConnection::builder("ws://127.0.0.1:8000/chats/123")
//!     .max_reconnect_attempts(10)
//!     .base_interval(Duration::from_secs(2))
//!     .backoff_multiplier(2.0)
//!     .handler(Callbacks::new().on_open(|| println!("Connected")))
//!     .connect()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::transport::{Connector, WsConnector};

use super::core::ResilientConnection;
use super::handler::EventHandler;
use super::options::ReconnectOptions;
use super::state::Status;
use super::supervisor::Supervisor;

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for a [`ResilientConnection`].
///
/// Use [`ResilientConnection::builder()`] to create a new builder.
pub struct ConnectionBuilder {
    /// Target endpoint.
    endpoint: String,
    /// Subprotocols, in preference order.
    subprotocols: Vec<String>,
    /// Reconnect policy.
    options: ReconnectOptions,
    /// Event observer, `()` when unset.
    handler: Option<Box<dyn EventHandler>>,
    /// Transport factory, [`WsConnector`] when unset.
    connector: Option<Box<dyn Connector>>,
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            subprotocols: Vec::new(),
            options: ReconnectOptions::new(),
            handler: None,
            connector: None,
        }
    }

    /// Adds a subprotocol.
    #[inline]
    #[must_use]
    pub fn subprotocol(mut self, name: impl Into<String>) -> Self {
        self.subprotocols.push(name.into());
        self
    }

    /// Adds several subprotocols, keeping their order.
    #[inline]
    #[must_use]
    pub fn subprotocols<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replaces all reconnect options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ReconnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Limits consecutive reconnect attempts.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.options = self.options.with_max_reconnect_attempts(attempts);
        self
    }

    /// Sets the base retry interval.
    #[inline]
    #[must_use]
    pub fn base_interval(mut self, interval: Duration) -> Self {
        self.options = self.options.with_base_interval(interval);
        self
    }

    /// Sets the backoff multiplier.
    #[inline]
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.options = self.options.with_backoff_multiplier(multiplier);
        self
    }

    /// Sets the event handler.
    #[inline]
    #[must_use]
    pub fn handler(mut self, handler: impl EventHandler) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Sets the transport connector.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Validates the options, starts the first attempt and spawns the supervisor.
    ///
    /// The endpoint is not checked here; a bad endpoint is reported through
    /// the handler like any other connection failure.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn connect(self) -> Result<ResilientConnection> {
        self.options.validate()?;

        let runtime = Handle::try_current()
            .map_err(|e| Error::config(format!("A tokio runtime is required: {e}")))?;

        let id = ConnectionId::generate();
        let status = Arc::new(RwLock::new(Status::connecting()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let mut supervisor = Supervisor::new(
            id,
            self.endpoint.clone(),
            self.subprotocols.clone(),
            self.options,
            self.connector
                .unwrap_or_else(|| Box::new(WsConnector::new())),
            self.handler.unwrap_or_else(|| Box::new(())),
            Arc::clone(&status),
        );

        let closed = supervisor.closed_receiver();

        // Enter the runtime so connectors may spawn their own tasks.
        {
            let _guard = runtime.enter();
            supervisor.connect();
            runtime.spawn(supervisor.run(command_rx));
        }

        debug!(connection_id = %id, endpoint = %self.endpoint, "Connection created");

        Ok(ResilientConnection::from_parts(
            id,
            self.endpoint,
            self.subprotocols,
            command_tx,
            status,
            closed,
        ))
    }
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("endpoint", &self.endpoint)
            .field("subprotocols", &self.subprotocols)
            .field("options", &self.options)
            .field("handler", &self.handler.is_some())
            .field("connector", &self.connector.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
