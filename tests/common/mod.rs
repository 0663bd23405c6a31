//! Shared test utilities.
//!
//! - [`MockConnector`]: hands every transport attempt to the test, which
//!   then plays the socket's part through the [`TransportLink`]
//! - [`EchoServer`]: loopback WebSocket server for end-to-end tests

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use resilient_ws::transport::{Connector, TransportHandle, TransportLink};
use resilient_ws::{ConnectionEvent, Generation};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

// ============================================================================
// Timeouts
// ============================================================================

/// Upper bound for waits under paused time (auto-advance makes this instant).
pub const PAUSED_WAIT: Duration = Duration::from_secs(365 * 24 * 3600);

/// Upper bound for waits against a real socket.
pub const REAL_WAIT: Duration = Duration::from_secs(10);

// ============================================================================
// MockConnector
// ============================================================================

/// One transport attempt made by the connection under test.
#[derive(Debug)]
pub struct Attempt {
    pub endpoint: String,
    pub subprotocols: Vec<String>,
    pub generation: Generation,
    pub link: TransportLink,
}

/// Connector that forwards each attempt to the test.
#[derive(Debug, Clone)]
pub struct MockConnector {
    attempts: mpsc::UnboundedSender<Attempt>,
}

impl MockConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Attempt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { attempts: tx }, rx)
    }
}

impl Connector for MockConnector {
    fn connect(
        &self,
        endpoint: &str,
        subprotocols: &[String],
        generation: Generation,
    ) -> TransportHandle {
        let (handle, link) = TransportHandle::channel(generation);
        let _ = self.attempts.send(Attempt {
            endpoint: endpoint.to_owned(),
            subprotocols: subprotocols.to_vec(),
            generation,
            link,
        });
        handle
    }
}

// ============================================================================
// Waiting Helpers
// ============================================================================

/// Waits for the next connection event.
pub async fn next_event(
    events: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
    wait: Duration,
) -> ConnectionEvent {
    timeout(wait, events.recv())
        .await
        .expect("timed out waiting for connection event")
        .expect("event channel closed")
}

/// Waits for the next transport attempt.
pub async fn next_attempt(attempts: &mut mpsc::UnboundedReceiver<Attempt>) -> Attempt {
    timeout(PAUSED_WAIT, attempts.recv())
        .await
        .expect("timed out waiting for transport attempt")
        .expect("attempt channel closed")
}

/// Skips events until one matches, returning it.
pub async fn wait_for(
    events: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
    wait: Duration,
    mut matches: impl FnMut(&ConnectionEvent) -> bool,
) -> ConnectionEvent {
    loop {
        let event = next_event(events, wait).await;
        if matches(&event) {
            return event;
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// EchoServer
// ============================================================================

/// Loopback WebSocket server.
///
/// Replies to each text message with `Message received [{id}]: {text}`,
/// where `id` is the last path segment. The text `kick` makes the server
/// close that connection with code 4000.
pub struct EchoServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl EchoServer {
    /// Binds to a random port.
    pub async fn start() -> Self {
        Self::bind("127.0.0.1:0".parse().unwrap()).await
    }

    /// Binds to a specific address.
    pub async fn bind(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.expect("bind should succeed");
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream));
            }
        });

        Self { addr, task }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Returns a loopback port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn serve(stream: TcpStream) {
    let mut chat_id = String::new();

    let callback = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        chat_id = request
            .uri()
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();

        // Accept the first offered subprotocol.
        if let Some(offered) = request.headers().get(SEC_WEBSOCKET_PROTOCOL)
            && let Ok(offered) = offered.to_str()
            && let Some(first) = offered.split(',').next()
        {
            response.headers_mut().insert(
                SEC_WEBSOCKET_PROTOCOL,
                HeaderValue::from_str(first.trim()).unwrap(),
            );
        }

        Ok(response)
    };

    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) if text.as_str() == "kick" => {
                let frame = CloseFrame {
                    code: CloseCode::from(4000),
                    reason: "kicked".into(),
                };
                // Keep reading so the client's close reply is consumed.
                if ws.close(Some(frame)).await.is_err() {
                    break;
                }
            }
            Message::Text(text) => {
                let reply = format!("Message received [{chat_id}]: {}", text.as_str());
                if ws.send(Message::text(reply)).await.is_err() {
                    break;
                }
            }
            Message::Binary(bytes) => {
                if ws.send(Message::Binary(bytes)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
