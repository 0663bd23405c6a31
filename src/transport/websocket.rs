//! WebSocket transport backed by tokio-tungstenite.
//!
//! Each call to [`WsConnector::connect`] spawns one tokio task that owns
//! the socket for its whole life:
//!
//! - Establishes the connection (cancellable by a close command)
//! - Forwards incoming text/binary frames as [`TransportEvent::Message`]
//! - Writes outgoing [`TransportCommand::Send`] payloads
//! - Ends with exactly one [`TransportEvent::Closed`]

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::Generation;
use crate::protocol::{CloseInfo, Payload};

use super::handle::{Connector, TransportCommand, TransportEvent, TransportHandle, TransportLink};

// ============================================================================
// WsConnector
// ============================================================================

/// Connector that opens real WebSocket connections.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    /// Creates a new WebSocket connector.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn connect(
        &self,
        endpoint: &str,
        subprotocols: &[String],
        generation: Generation,
    ) -> TransportHandle {
        let (handle, link) = TransportHandle::channel(generation);

        tokio::spawn(run_transport(
            endpoint.to_owned(),
            subprotocols.to_vec(),
            link,
        ));

        handle
    }
}

// ============================================================================
// Request Building
// ============================================================================

/// Validates the endpoint and builds the handshake request.
fn build_request(endpoint: &str, subprotocols: &[String]) -> Result<Request> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::invalid_endpoint(endpoint, e.to_string()))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::invalid_endpoint(
            endpoint,
            format!("unsupported scheme '{}', expected ws or wss", url.scheme()),
        ));
    }

    let mut request = url.as_str().into_client_request()?;

    if !subprotocols.is_empty() {
        let value = HeaderValue::from_str(&subprotocols.join(", "))
            .map_err(|e| Error::config(format!("Invalid subprotocol list: {e}")))?;
        request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
    }

    Ok(request)
}

// ============================================================================
// Transport Task
// ============================================================================

/// Drives one WebSocket from handshake to close.
async fn run_transport(endpoint: String, subprotocols: Vec<String>, mut link: TransportLink) {
    let generation = link.generation();

    let request = match build_request(&endpoint, &subprotocols) {
        Ok(request) => request,
        Err(e) => {
            debug!(%generation, error = %e, "Rejected endpoint");
            link.fail(e);
            return;
        }
    };

    let connect = connect_async(request);
    tokio::pin!(connect);

    // Handshake phase
    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    debug!(%generation, error = %e, "WebSocket handshake failed");
                    link.fail(Error::WebSocket(e));
                    return;
                }
            },

            command = link.next_command() => match command {
                Some(TransportCommand::Send(payload)) => {
                    warn!(%generation, len = payload.len(), "Send before open dropped");
                }

                Some(TransportCommand::Close(info)) => {
                    debug!(%generation, "Closed before handshake completed");
                    link.emit(TransportEvent::Closed(info));
                    return;
                }

                None => {
                    trace!(%generation, "Handle dropped during handshake");
                    return;
                }
            },
        }
    };

    debug!(%generation, %endpoint, "WebSocket open");
    link.emit(TransportEvent::Opened);

    let (mut ws_write, mut ws_read) = ws_stream.split();
    let mut received_close: Option<CloseInfo> = None;

    // Message phase
    let close = loop {
        tokio::select! {
            message = ws_read.next() => match message {
                Some(Ok(Message::Close(frame))) => {
                    let info = CloseInfo::from_frame(frame);
                    debug!(%generation, close = %info, "Close frame received");
                    // Keep reading so tungstenite can finish the close handshake.
                    received_close = Some(info);
                }

                Some(Ok(message)) => {
                    if let Some(payload) = Payload::from_message(message) {
                        trace!(%generation, len = payload.len(), "Message received");
                        link.emit(TransportEvent::Message(payload));
                    }
                }

                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed))
                    if received_close.is_some() =>
                {
                    break received_close.take().unwrap_or_else(CloseInfo::abnormal);
                }

                Some(Err(e)) => {
                    warn!(%generation, error = %e, "WebSocket error");
                    link.emit(TransportEvent::Error(Error::WebSocket(e)));
                    break received_close.take().unwrap_or_else(CloseInfo::abnormal);
                }

                None => {
                    trace!(%generation, "WebSocket stream ended");
                    break received_close.take().unwrap_or_else(CloseInfo::abnormal);
                }
            },

            command = link.next_command() => match command {
                Some(TransportCommand::Send(payload)) => {
                    let len = payload.len();
                    if let Err(e) = ws_write.send(payload.into()).await {
                        warn!(%generation, error = %e, "Failed to send message");
                        link.emit(TransportEvent::Error(Error::WebSocket(e)));
                    } else {
                        trace!(%generation, len, "Message sent");
                    }
                }

                Some(TransportCommand::Close(info)) => {
                    debug!(%generation, close = %info, "Closing WebSocket");
                    let _ = ws_write.send(Message::Close(Some(info.to_frame()))).await;
                    break info;
                }

                None => {
                    trace!(%generation, "Handle dropped, closing WebSocket");
                    let _ = ws_write.close().await;
                    break CloseInfo::normal();
                }
            },
        }
    };

    link.emit(TransportEvent::Closed(close));
    debug!(%generation, "Transport terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_plain() {
        let request = build_request("ws://127.0.0.1:8000/chats/123", &[]).unwrap();
        assert_eq!(request.uri(), "ws://127.0.0.1:8000/chats/123");
        assert!(request.headers().get(SEC_WEBSOCKET_PROTOCOL).is_none());
    }

    #[test]
    fn test_build_request_with_subprotocols() {
        let protocols = vec!["chat".to_string(), "superchat".to_string()];
        let request = build_request("wss://example.com/socket", &protocols).unwrap();
        assert_eq!(
            request.headers().get(SEC_WEBSOCKET_PROTOCOL).unwrap(),
            "chat, superchat"
        );
    }

    #[test]
    fn test_build_request_rejects_http_scheme() {
        let err = build_request("http://example.com", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_build_request_rejects_garbage() {
        let err = build_request("not a url", &[]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_malformed_endpoint_reports_error_then_close() {
        let mut handle = WsConnector::new().connect("::nope::", &[], Generation::new(1));

        assert!(matches!(
            handle.next_event().await,
            TransportEvent::Error(Error::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            handle.next_event().await,
            TransportEvent::Closed(ref info) if info.code == 1006
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_close() {
        // Bind and drop to get a port with no listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = format!("ws://127.0.0.1:{port}");
        let mut handle = WsConnector::new().connect(&endpoint, &[], Generation::new(1));

        assert!(matches!(handle.next_event().await, TransportEvent::Error(_)));
        assert!(matches!(handle.next_event().await, TransportEvent::Closed(_)));
    }
}
