//! Supervisor task: the single owner of connection state.
//!
//! The supervisor selects over three sources and handles one at a time:
//!
//! - Commands from the [`ResilientConnection`](super::ResilientConnection) handle
//! - Events from the live transport (if any)
//! - The pending retry timer (if any)
//!
//! Replacing the transport drops the previous event receiver, so events
//! from a discarded transport are never observed.
//!
//! After a caller close the supervisor stays in `Closed` until the handle is
//! dropped, so late sends are still reported to the handler.

// ============================================================================
// Imports
// ============================================================================

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, trace, warn};

use crate::error::Error;
use crate::identifiers::{ConnectionId, Generation};
use crate::protocol::{CloseInfo, Payload};
use crate::transport::{Connector, TransportCommand, TransportEvent, TransportHandle};

use super::handler::EventHandler;
use super::options::ReconnectOptions;
use super::state::{ConnectionState, Status};

// ============================================================================
// Command
// ============================================================================

/// Commands from the handle to the supervisor.
#[derive(Debug)]
pub(crate) enum Command {
    /// Forward data if open, report an error otherwise.
    Send(Payload),
    /// Close for good.
    Close(CloseInfo),
    /// Explicit reopen after exhaustion or while waiting.
    Reconnect,
}

// ============================================================================
// Supervisor
// ============================================================================

pub(crate) struct Supervisor {
    id: ConnectionId,
    endpoint: String,
    subprotocols: Vec<String>,
    options: ReconnectOptions,
    connector: Box<dyn Connector>,
    handler: Box<dyn EventHandler>,
    /// Mirror of `state`/`attempt_count` for synchronous queries.
    status: Arc<RwLock<Status>>,
    state: ConnectionState,
    attempt_count: u32,
    generation: Generation,
    transport: Option<TransportHandle>,
    retry: Option<Pin<Box<Sleep>>>,
    /// Flipped to `true` once a caller close has been processed.
    closed: watch::Sender<bool>,
}

impl Supervisor {
    pub(crate) fn new(
        id: ConnectionId,
        endpoint: String,
        subprotocols: Vec<String>,
        options: ReconnectOptions,
        connector: Box<dyn Connector>,
        handler: Box<dyn EventHandler>,
        status: Arc<RwLock<Status>>,
    ) -> Self {
        Self {
            id,
            endpoint,
            subprotocols,
            options,
            connector,
            handler,
            status,
            state: ConnectionState::Connecting,
            attempt_count: 0,
            generation: Generation::default(),
            transport: None,
            retry: None,
            closed: watch::Sender::new(false),
        }
    }

    /// Receiver that turns `true` once a caller close has been processed.
    pub(crate) fn closed_receiver(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// Runs until the handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        if self.transport.is_none() {
            self.connect();
        }

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!(connection_id = %self.id, "Handle dropped");
                        if !self.state.is_idle() {
                            self.close(CloseInfo::normal());
                        }
                        break;
                    };

                    self.handle_command(command);
                }

                event = next_event(&mut self.transport) => {
                    self.handle_transport_event(event);
                }

                () = retry_elapsed(&mut self.retry) => {
                    self.retry = None;
                    info!(
                        connection_id = %self.id,
                        attempt = self.attempt_count,
                        "Attempting to reconnect"
                    );
                    self.connect();
                }
            }
        }

        debug!(connection_id = %self.id, "Supervisor terminated");
    }

    /// Starts a new transport, discarding the current one if any.
    pub(crate) fn connect(&mut self) {
        if let Some(old) = self.transport.take() {
            trace!(
                connection_id = %self.id,
                generation = %old.generation(),
                "Discarding previous transport"
            );
            old.command(TransportCommand::Close(CloseInfo::normal()));
        }

        self.generation = self.generation.next();
        debug!(
            connection_id = %self.id,
            generation = %self.generation,
            endpoint = %self.endpoint,
            "Connecting"
        );

        self.transport = Some(self.connector.connect(
            &self.endpoint,
            &self.subprotocols,
            self.generation,
        ));
        self.set_state(ConnectionState::Connecting);
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        *self.status.write() = Status {
            state,
            attempt_count: self.attempt_count,
        };
    }
}

// ============================================================================
// Command Handling
// ============================================================================

impl Supervisor {
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send(payload) => self.send(payload),

            Command::Close(info) => {
                if self.state.is_terminal() {
                    debug!(connection_id = %self.id, close = %info, "Already closed");
                } else {
                    self.close(info);
                }
            }

            // Only valid while no transport is live.
            Command::Reconnect => {
                if self.transport.is_some() || self.state.is_terminal() {
                    debug!(connection_id = %self.id, state = %self.state, "Reconnect ignored");
                } else {
                    info!(
                        connection_id = %self.id,
                        attempt = self.attempt_count,
                        "Explicit reconnect"
                    );
                    self.retry = None;
                    self.connect();
                }
            }
        }
    }

    fn send(&mut self, payload: Payload) {
        if self.state.is_open()
            && let Some(transport) = self.transport.as_ref()
        {
            if !transport.command(TransportCommand::Send(payload)) {
                self.handler
                    .on_error(Error::connection("Transport is gone, message dropped"));
            }
            return;
        }

        warn!(
            connection_id = %self.id,
            state = %self.state,
            len = payload.len(),
            "WebSocket is not open, message dropped"
        );
        self.handler.on_error(Error::not_open(self.state));
    }

    fn close(&mut self, info: CloseInfo) {
        self.retry = None;

        if let Some(transport) = self.transport.take() {
            transport.command(TransportCommand::Close(info.clone()));
        }

        self.set_state(ConnectionState::Closed);
        self.closed.send_replace(true);
        info!(connection_id = %self.id, close = %info, "Connection closed by caller");
    }
}

// ============================================================================
// Transport Event Handling
// ============================================================================

impl Supervisor {
    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                self.attempt_count = 0;
                self.set_state(ConnectionState::Open);
                info!(
                    connection_id = %self.id,
                    generation = %self.generation,
                    "WebSocket connection opened"
                );
                self.handler.on_open();
            }

            TransportEvent::Message(payload) => {
                trace!(connection_id = %self.id, len = payload.len(), "Message received");
                self.handler.on_message(payload);
            }

            TransportEvent::Error(error) => {
                debug!(connection_id = %self.id, %error, "Transport error");
                self.handler.on_error(error);
            }

            TransportEvent::Closed(info) => self.transport_closed(info),
        }
    }

    fn transport_closed(&mut self, info: CloseInfo) {
        self.transport = None;

        if !self.options.allows_retry(self.attempt_count) {
            self.set_state(ConnectionState::RetriesExhausted);
            warn!(
                connection_id = %self.id,
                close = %info,
                attempts = self.attempt_count,
                "Maximum reconnect attempts reached"
            );
            self.handler.on_close(&info);
            self.handler.on_max_attempts_reached();
            return;
        }

        self.attempt_count += 1;
        let delay = self.options.delay_for(self.attempt_count);
        self.retry = Some(Box::pin(sleep(delay)));
        self.set_state(ConnectionState::WaitingRetry);

        info!(
            connection_id = %self.id,
            close = %info,
            attempt = self.attempt_count,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "WebSocket connection closed, retry scheduled"
        );
        self.handler.on_close(&info);
        self.handler.on_retry_scheduled(self.attempt_count, delay);
    }
}

// ============================================================================
// Select Helpers
// ============================================================================

/// Next event of the live transport; pending forever when there is none.
async fn next_event(transport: &mut Option<TransportHandle>) -> TransportEvent {
    match transport {
        Some(transport) => transport.next_event().await,
        None => pending().await,
    }
}

/// Completes when the pending retry fires; pending forever when there is none.
async fn retry_elapsed(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}
