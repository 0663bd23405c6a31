//! Connection states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`ResilientConnection`](crate::ResilientConnection).
///
/// ```text
///                 ┌──────────── retry timer ─────────────┐
///                 ▼                                      │
///  new ──► Connecting ──open──► Open ──close──► WaitingRetry
///                 │                                      ▲
///                 └──────────────── close ───────────────┘
///
///  Connecting | Open ──close, limit hit──► RetriesExhausted
///  any ──close()──► Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// A transport is being established.
    Connecting,
    /// The transport is established; `send` is forwarded.
    Open,
    /// The transport closed; a retry timer is pending.
    WaitingRetry,
    /// The transport closed and the attempt limit was reached.
    ///
    /// Only [`ResilientConnection::reconnect`](crate::ResilientConnection::reconnect)
    /// leaves this state.
    RetriesExhausted,
    /// Closed by the caller. Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if data can be sent.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if no transport is live and none is scheduled.
    #[inline]
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::RetriesExhausted | Self::Closed)
    }

    /// Returns `true` once the caller has closed the connection.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the state name in snake case.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::WaitingRetry => "waiting_retry",
            Self::RetriesExhausted => "retries_exhausted",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Snapshot shared between the supervisor and the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Status {
    pub(crate) state: ConnectionState,
    pub(crate) attempt_count: u32,
}

impl Status {
    pub(crate) const fn connecting() -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempt_count: 0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
