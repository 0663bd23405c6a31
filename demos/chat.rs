//! Terminal chat client.
//!
//! Connects to the echo server with the same reconnect settings as the
//! browser chat page (10 attempts, 2000 ms base, doubling) and sends every
//! line typed on stdin.
//!
//! Run with: cargo run --example chat -- [ws://127.0.0.1:8000/chats/123]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use resilient_ws::{Callbacks, ResilientConnection};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/chats/123";
const BOT_NAME: &str = "BOT";
const PERSON_NAME: &str = "You";

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

    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let callbacks = Callbacks::new()
        .on_open(|| {
            info!("Connected");
            print_message(
                BOT_NAME,
                "Hi, and welcome to Random Chat! Go ahead and send me a message.",
            );
        })
        .on_close(|info| info!(close = %info, "Disconnected"))
        .on_message(|payload| print_message(BOT_NAME, &payload.to_string()))
        .on_error(|e| {
            if e.is_config_error() {
                error!(error = %e, "Endpoint rejected");
            } else {
                warn!(error = %e, "WebSocket error");
            }
        })
        .on_retry_scheduled(|attempt, delay| {
            info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        })
        .on_max_attempts_reached(|| error!("Maximum reconnect attempts reached"));

    let conn = ResilientConnection::builder(endpoint)
        .max_reconnect_attempts(10)
        .base_interval(Duration::from_millis(2000))
        .backoff_multiplier(2.0)
        .handler(callbacks)
        .connect()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) if text.is_empty() => {}
                Some(text) => {
                    print_message(PERSON_NAME, &text);
                    conn.send(text);
                }
                None => break,
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    conn.close();
    conn.closed().await;
    Ok(())
}

fn print_message(from: &str, text: &str) {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let (hours, minutes) = ((now / 3600) % 24, (now / 60) % 60);

    println!("[{hours:02}:{minutes:02}] {from}: {text}");
}
