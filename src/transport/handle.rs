//! Connector trait and transport channel types.
//!
//! A [`TransportHandle`] is the supervisor's end of a transport; the
//! matching [`TransportLink`] is held by whatever drives the socket. Both
//! are created together by [`TransportHandle::channel`].

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Error;
use crate::identifiers::Generation;
use crate::protocol::{CloseInfo, Payload};

// ============================================================================
// Connector
// ============================================================================

/// Factory for transports.
///
/// `connect` must not block: it returns a handle right away and reports
/// the outcome of establishment through [`TransportEvent`]s. Every
/// transport must eventually emit [`TransportEvent::Closed`], including
/// when establishment fails.
pub trait Connector: Send + Sync + 'static {
    /// Starts a new transport to `endpoint`, negotiating `subprotocols`.
    fn connect(
        &self,
        endpoint: &str,
        subprotocols: &[String],
        generation: Generation,
    ) -> TransportHandle;
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Event emitted by a transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// The socket is established and ready to send.
    Opened,
    /// A data message arrived.
    Message(Payload),
    /// A transport-level error. A `Closed` event follows if the socket dies.
    Error(Error),
    /// The socket is closed. No further events follow.
    Closed(CloseInfo),
}

// ============================================================================
// TransportCommand
// ============================================================================

/// Command sent to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Send a message as-is.
    Send(Payload),
    /// Close the socket with a code and reason.
    Close(CloseInfo),
}

// ============================================================================
// TransportHandle
// ============================================================================

/// Supervisor-side end of one transport.
#[derive(Debug)]
pub struct TransportHandle {
    generation: Generation,
    commands: mpsc::UnboundedSender<TransportCommand>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportHandle {
    /// Creates a connected handle/link pair for a transport generation.
    #[must_use]
    pub fn channel(generation: Generation) -> (Self, TransportLink) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let handle = Self {
            generation,
            commands: command_tx,
            events: event_rx,
        };
        let link = TransportLink {
            generation,
            commands: command_rx,
            events: event_tx,
        };

        (handle, link)
    }

    /// Returns the generation of this transport.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Forwards a command to the transport.
    ///
    /// Returns `false` if the transport has already gone away.
    pub fn command(&self, command: TransportCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Receives the next event.
    ///
    /// A transport that vanishes without reporting `Closed` is treated as
    /// an abnormal close.
    pub async fn next_event(&mut self) -> TransportEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => {
                trace!(generation = %self.generation, "Transport ended without close event");
                TransportEvent::Closed(CloseInfo::abnormal())
            }
        }
    }
}

// ============================================================================
// TransportLink
// ============================================================================

/// Socket-side end of one transport.
#[derive(Debug)]
pub struct TransportLink {
    generation: Generation,
    commands: mpsc::UnboundedReceiver<TransportCommand>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportLink {
    /// Returns the generation of this transport.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Emits an event to the supervisor.
    ///
    /// Returns `false` once the supervisor has discarded this transport.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Reports an establishment failure: the error, then an abnormal close.
    pub fn fail(&self, error: Error) {
        self.emit(TransportEvent::Error(error));
        self.emit(TransportEvent::Closed(CloseInfo::abnormal()));
    }

    /// Receives the next command. `None` means the handle was dropped.
    pub async fn next_command(&mut self) -> Option<TransportCommand> {
        self.commands.recv().await
    }

    /// Returns a pending command without waiting.
    pub fn try_next_command(&mut self) -> Option<TransportCommand> {
        self.commands.try_recv().ok()
    }

    /// Returns `true` once the supervisor has discarded this transport.
    #[inline]
    #[must_use]
    pub fn is_discarded(&self) -> bool {
        self.events.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================
