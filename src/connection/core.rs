//! The connection handle.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::protocol::{CloseInfo, Payload};

use super::builder::ConnectionBuilder;
use super::handler::EventHandler;
use super::state::{ConnectionState, Status};
use super::supervisor::Command;

// ============================================================================
// ResilientConnection
// ============================================================================

/// A WebSocket client that reconnects by itself.
///
/// Creating a connection immediately starts the first attempt. When the
/// transport closes, the connection retries after
/// `base_interval * multiplier^n` until it opens again or the attempt limit
/// is reached. Events are reported to the [`EventHandler`] supplied at
/// construction.
///
/// # Delivery
///
/// [`send`](Self::send) is at-most-once: data submitted while the
/// connection is not open is dropped and reported through
/// [`EventHandler::on_error`]. Nothing is buffered across reconnects.
///
/// # Thread Safety
///
/// `ResilientConnection` is `Send + Sync`; all state is owned by a single
/// supervisor task, and every method only posts a command to it.
pub struct ResilientConnection {
    /// Connection identifier used in logs.
    id: ConnectionId,
    /// Target endpoint.
    endpoint: String,
    /// Subprotocols offered on every attempt.
    subprotocols: Vec<String>,
    /// Channel to the supervisor.
    commands: mpsc::UnboundedSender<Command>,
    /// Status mirror written by the supervisor.
    status: Arc<RwLock<Status>>,
    /// Turns `true` once the supervisor has processed a close.
    closed: watch::Receiver<bool>,
}

impl ResilientConnection {
    /// Creates a builder for a connection to `endpoint`.
    #[inline]
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(endpoint)
    }

    /// Connects with default reconnect options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if called outside a tokio runtime.
    pub fn connect<I, S>(
        endpoint: impl Into<String>,
        subprotocols: I,
        handler: impl EventHandler,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConnectionBuilder::new(endpoint)
            .subprotocols(subprotocols)
            .handler(handler)
            .connect()
    }

    pub(crate) fn from_parts(
        id: ConnectionId,
        endpoint: String,
        subprotocols: Vec<String>,
        commands: mpsc::UnboundedSender<Command>,
        status: Arc<RwLock<Status>>,
        closed: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            endpoint,
            subprotocols,
            commands,
            status,
            closed,
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

impl ResilientConnection {
    /// Sends data if the connection is open.
    ///
    /// Never blocks. If the connection is not open (closed included) the
    /// data is dropped and [`EventHandler::on_error`] receives
    /// [`Error::NotOpen`](crate::Error::NotOpen).
    pub fn send(&self, data: impl Into<Payload>) {
        self.post(Command::Send(data.into()));
    }

    /// Closes the connection with code 1000 and an empty reason.
    #[inline]
    pub fn close(&self) {
        self.close_with(CloseInfo::normal().code, "");
    }

    /// Closes the connection with a code and reason.
    ///
    /// Cancels a pending retry and asks the live transport (if any) to
    /// close. No reconnect happens afterwards. Only the first call has an
    /// effect.
    pub fn close_with(&self, code: u16, reason: impl Into<String>) {
        self.post(Command::Close(CloseInfo::new(code, reason)));
    }

    /// Reopens the connection after retries were exhausted.
    ///
    /// While a retry is pending this connects immediately instead. Ignored
    /// while connecting, open, or closed. The attempt counter is kept; it is
    /// only reset by a successful open.
    pub fn reconnect(&self) {
        self.post(Command::Reconnect);
    }

    /// Waits until [`close`](Self::close) has been processed.
    ///
    /// Once this resolves, [`state`](Self::state) is
    /// [`ConnectionState::Closed`] and the transport has been asked to close.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();

        // An error means the supervisor is gone, which is closed as well.
        let _ = closed.wait_for(|done| *done).await;
    }

    /// Posts a command. The supervisor runs for as long as this handle
    /// exists unless its runtime is shutting down.
    fn post(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!(connection_id = %self.id, "Supervisor stopped, command dropped");
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

impl ResilientConnection {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the subprotocols offered on each attempt.
    #[inline]
    #[must_use]
    pub fn subprotocols(&self) -> &[String] {
        &self.subprotocols
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status.read().state
    }

    /// Returns `true` if data sent now would be forwarded.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the number of consecutive failed cycles since the last open.
    #[inline]
    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.status.read().attempt_count
    }
}

impl std::fmt::Debug for ResilientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = *self.status.read();
        f.debug_struct("ResilientConnection")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("subprotocols", &self.subprotocols)
            .field("state", &status.state)
            .field("attempt_count", &status.attempt_count)
            .finish_non_exhaustive()
    }
}
