//! Chat echo server.
//!
//! Accepts WebSocket connections on `/chats/{chat_id}` and answers every
//! text message with `Message received [{chat_id}]: {text}`.
//!
//! Run with: cargo run --example echo_server -- [--port 8000]

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = parse_port()?;
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!(addr = %listener.local_addr()?, "Echo server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(e) = handle(stream).await {
                warn!(%peer, error = %e, "WebSocket closed with error");
            }
        });
    }
}

fn parse_port() -> anyhow::Result<u16> {
    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--port") {
        Some(i) => {
            let value = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("--port requires a value"))?;
            Ok(value.parse()?)
        }
        None => Ok(8000),
    }
}

// ============================================================================
// Connection Handler
// ============================================================================

async fn handle(stream: TcpStream) -> anyhow::Result<()> {
    let mut chat_id = None;

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let path = request.uri().path();
        match path.strip_prefix("/chats/").filter(|id| !id.is_empty() && !id.contains('/')) {
            Some(id) => {
                chat_id = Some(id.to_owned());
                Ok(response)
            }
            None => {
                let mut reject = ErrorResponse::new(Some(format!("No route for {path}")));
                *reject.status_mut() = StatusCode::NOT_FOUND;
                Err(reject)
            }
        }
    };

    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback).await?;
    let chat_id = chat_id.unwrap_or_default();
    info!(%chat_id, "Client connected");

    while let Some(message) = ws.next().await {
        match message? {
            Message::Text(text) => {
                let reply = format!("Message received [{chat_id}]: {}", text.as_str());
                ws.send(Message::text(reply)).await?;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(%chat_id, "Client disconnected");
    Ok(())
}
