//! Observer surface of a connection.
//!
//! The supervisor reports every transition through an [`EventHandler`].
//! Three ready-made forms are provided:
//!
//! | Form | Use |
//! |------|-----|
//! | [`Callbacks`] | One closure per event |
//! | `mpsc::UnboundedSender<ConnectionEvent>` | Consume events as a stream |
//! | `()` | Ignore everything |
//!
//! For an unexpected close the order is always `on_close`, then either
//! `on_retry_scheduled` or `on_max_attempts_reached`.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::protocol::{CloseInfo, Payload};

// ============================================================================
// EventHandler
// ============================================================================

/// Receives connection events.
///
/// Handlers run on the supervisor task, one at a time and in order. They
/// should return quickly; long work belongs on another task.
#[allow(unused_variables)]
pub trait EventHandler: Send + 'static {
    /// The transport opened. The attempt counter is already reset.
    fn on_open(&mut self) {}

    /// The transport closed unexpectedly. Not called for a caller's `close()`.
    fn on_close(&mut self, info: &CloseInfo) {}

    /// A message arrived.
    fn on_message(&mut self, payload: Payload) {}

    /// A transport error occurred, or a send was dropped.
    fn on_error(&mut self, error: Error) {}

    /// A retry was scheduled after `delay`.
    fn on_retry_scheduled(&mut self, attempt: u32, delay: Duration) {}

    /// The attempt limit was reached; no retry is scheduled.
    fn on_max_attempts_reached(&mut self) {}
}

impl EventHandler for () {}

// ============================================================================
// ConnectionEvent
// ============================================================================

/// Event form of the [`EventHandler`] callbacks.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// See [`EventHandler::on_open`].
    Opened,
    /// See [`EventHandler::on_close`].
    Closed(CloseInfo),
    /// See [`EventHandler::on_message`].
    Message(Payload),
    /// See [`EventHandler::on_error`].
    Error(Error),
    /// See [`EventHandler::on_retry_scheduled`].
    RetryScheduled {
        /// Attempt number (1 for the first retry).
        attempt: u32,
        /// Delay before the retry.
        delay: Duration,
    },
    /// See [`EventHandler::on_max_attempts_reached`].
    MaxAttemptsReached,
}

impl EventHandler for mpsc::UnboundedSender<ConnectionEvent> {
    fn on_open(&mut self) {
        let _ = self.send(ConnectionEvent::Opened);
    }

    fn on_close(&mut self, info: &CloseInfo) {
        let _ = self.send(ConnectionEvent::Closed(info.clone()));
    }

    fn on_message(&mut self, payload: Payload) {
        let _ = self.send(ConnectionEvent::Message(payload));
    }

    fn on_error(&mut self, error: Error) {
        let _ = self.send(ConnectionEvent::Error(error));
    }

    fn on_retry_scheduled(&mut self, attempt: u32, delay: Duration) {
        let _ = self.send(ConnectionEvent::RetryScheduled { attempt, delay });
    }

    fn on_max_attempts_reached(&mut self) {
        let _ = self.send(ConnectionEvent::MaxAttemptsReached);
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// Callback with no arguments.
pub type Callback = Box<dyn FnMut() + Send>;

/// Closure-based [`EventHandler`].
///
/// Unset callbacks do nothing.
///
/// # Example
///
/// ```ignore
/// use resilient_ws::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .on_open(|| println!("Connected"))
///     .on_message(|payload| println!("Received: {payload}"))
///     .on_max_attempts_reached(|| eprintln!("Giving up"));
/// ```
#[derive(Default)]
pub struct Callbacks {
    open: Option<Callback>,
    close: Option<Box<dyn FnMut(&CloseInfo) + Send>>,
    message: Option<Box<dyn FnMut(Payload) + Send>>,
    error: Option<Box<dyn FnMut(Error) + Send>>,
    retry_scheduled: Option<Box<dyn FnMut(u32, Duration) + Send>>,
    max_attempts_reached: Option<Callback>,
}

impl Callbacks {
    /// Creates an empty callback set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the open callback.
    #[must_use]
    pub fn on_open(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.open = Some(Box::new(f));
        self
    }

    /// Sets the close callback.
    #[must_use]
    pub fn on_close(mut self, f: impl FnMut(&CloseInfo) + Send + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }

    /// Sets the message callback.
    #[must_use]
    pub fn on_message(mut self, f: impl FnMut(Payload) + Send + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(Error) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the retry-scheduled callback.
    #[must_use]
    pub fn on_retry_scheduled(mut self, f: impl FnMut(u32, Duration) + Send + 'static) -> Self {
        self.retry_scheduled = Some(Box::new(f));
        self
    }

    /// Sets the retries-exhausted callback.
    #[must_use]
    pub fn on_max_attempts_reached(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.max_attempts_reached = Some(Box::new(f));
        self
    }
}

impl EventHandler for Callbacks {
    fn on_open(&mut self) {
        if let Some(f) = self.open.as_mut() {
            f();
        }
    }

    fn on_close(&mut self, info: &CloseInfo) {
        if let Some(f) = self.close.as_mut() {
            f(info);
        }
    }

    fn on_message(&mut self, payload: Payload) {
        if let Some(f) = self.message.as_mut() {
            f(payload);
        }
    }

    fn on_error(&mut self, error: Error) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }

    fn on_retry_scheduled(&mut self, attempt: u32, delay: Duration) {
        if let Some(f) = self.retry_scheduled.as_mut() {
            f(attempt, delay);
        }
    }

    fn on_max_attempts_reached(&mut self) {
        if let Some(f) = self.max_attempts_reached.as_mut() {
            f();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
