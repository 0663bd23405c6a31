//! End-to-end tests against a loopback WebSocket server.

mod common;

use std::time::Duration;

use resilient_ws::{
    Callbacks, ConnectionEvent, ConnectionState, Error, Payload, ResilientConnection,
};
use tokio::sync::mpsc;

use common::{EchoServer, REAL_WAIT, next_event, unused_port, wait_for};

fn fast(endpoint: String) -> resilient_ws::ConnectionBuilder {
    ResilientConnection::builder(endpoint)
        .base_interval(Duration::from_millis(20))
        .backoff_multiplier(1.0)
}

#[tokio::test]
async fn test_echo_round_trip() {
    common::init_tracing();
    let server = EchoServer::start().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(server.url("/chats/123"))
        .handler(events_tx)
        .connect()
        .unwrap();

    assert!(matches!(
        next_event(&mut events, REAL_WAIT).await,
        ConnectionEvent::Opened
    ));
    assert!(conn.is_open());

    conn.send("hello");

    match next_event(&mut events, REAL_WAIT).await {
        ConnectionEvent::Message(payload) => {
            assert_eq!(payload.as_text(), Some("Message received [123]: hello"));
        }
        other => panic!("expected message, got {other:?}"),
    }

    conn.close();
    conn.closed().await;
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_binary_round_trip() {
    let server = EchoServer::start().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(server.url("/chats/1"))
        .handler(events_tx)
        .connect()
        .unwrap();

    wait_for(&mut events, REAL_WAIT, |e| matches!(e, ConnectionEvent::Opened)).await;
    conn.send(vec![1u8, 2, 3]);

    match next_event(&mut events, REAL_WAIT).await {
        ConnectionEvent::Message(payload) => assert_eq!(payload, Payload::Binary(vec![1, 2, 3])),
        other => panic!("expected message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_subprotocol_is_negotiated() {
    let server = EchoServer::start().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(server.url("/chats/7"))
        .subprotocols(["chat", "superchat"])
        .handler(events_tx)
        .connect()
        .unwrap();

    wait_for(&mut events, REAL_WAIT, |e| matches!(e, ConnectionEvent::Opened)).await;
    assert_eq!(conn.subprotocols(), ["chat", "superchat"]);
}

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    common::init_tracing();
    let server = EchoServer::start().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(server.url("/chats/9"))
        .handler(events_tx)
        .connect()
        .unwrap();

    wait_for(&mut events, REAL_WAIT, |e| matches!(e, ConnectionEvent::Opened)).await;
    conn.send("kick");

    match wait_for(&mut events, REAL_WAIT, |e| {
        matches!(e, ConnectionEvent::Closed(_))
    })
    .await
    {
        ConnectionEvent::Closed(info) => {
            assert_eq!(info.code, 4000);
            assert_eq!(info.reason, "kicked");
        }
        _ => unreachable!(),
    }

    match next_event(&mut events, REAL_WAIT).await {
        ConnectionEvent::RetryScheduled { attempt, delay } => {
            assert_eq!(attempt, 1);
            assert_eq!(delay, Duration::from_millis(20));
        }
        other => panic!("expected retry, got {other:?}"),
    }

    wait_for(&mut events, REAL_WAIT, |e| matches!(e, ConnectionEvent::Opened)).await;
    assert_eq!(conn.attempt_count(), 0);

    conn.send("back");
    let reply = wait_for(&mut events, REAL_WAIT, |e| {
        matches!(e, ConnectionEvent::Message(_))
    })
    .await;
    assert!(matches!(
        reply,
        ConnectionEvent::Message(Payload::Text(ref text)) if text == "Message received [9]: back"
    ));
}

#[tokio::test]
async fn test_recovers_when_server_comes_up() {
    let port = unused_port().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(format!("ws://127.0.0.1:{port}/chats/5"))
        .handler(events_tx)
        .connect()
        .unwrap();

    // Establishment failures surface as error then close.
    assert!(matches!(
        next_event(&mut events, REAL_WAIT).await,
        ConnectionEvent::Error(Error::WebSocket(_))
    ));
    assert!(matches!(
        next_event(&mut events, REAL_WAIT).await,
        ConnectionEvent::Closed(_)
    ));

    let _server = EchoServer::bind(format!("127.0.0.1:{port}").parse().unwrap()).await;

    wait_for(&mut events, REAL_WAIT, |e| matches!(e, ConnectionEvent::Opened)).await;
    assert!(conn.is_open());
    assert_eq!(conn.attempt_count(), 0);
}

#[tokio::test]
async fn test_exhaustion_against_dead_endpoint() {
    let port = unused_port().await;
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast(format!("ws://127.0.0.1:{port}"))
        .max_reconnect_attempts(2)
        .handler(events_tx)
        .connect()
        .unwrap();

    wait_for(&mut events, REAL_WAIT, |e| {
        matches!(e, ConnectionEvent::MaxAttemptsReached)
    })
    .await;

    assert_eq!(conn.state(), ConnectionState::RetriesExhausted);
    assert_eq!(conn.attempt_count(), 2);
}

#[tokio::test]
async fn test_malformed_endpoint_fails_asynchronously() {
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let conn = fast("definitely not a url".to_string())
        .max_reconnect_attempts(0)
        .handler(events_tx)
        .connect()
        .expect("construction never fails on the endpoint");

    assert!(matches!(
        next_event(&mut events, REAL_WAIT).await,
        ConnectionEvent::Error(Error::InvalidEndpoint { .. })
    ));
    wait_for(&mut events, REAL_WAIT, |e| {
        matches!(e, ConnectionEvent::MaxAttemptsReached)
    })
    .await;
    assert_eq!(conn.state(), ConnectionState::RetriesExhausted);
}

#[tokio::test]
async fn test_callbacks_handler() {
    let server = EchoServer::start().await;
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let open_tx = tx.clone();

    let conn = fast(server.url("/chats/42"))
        .handler(
            Callbacks::new()
                .on_open(move || {
                    let _ = open_tx.send("open".into());
                })
                .on_message(move |payload| {
                    let _ = tx.send(payload.to_string());
                }),
        )
        .connect()
        .unwrap();

    assert_eq!(
        tokio::time::timeout(REAL_WAIT, rx.recv()).await.unwrap().as_deref(),
        Some("open")
    );

    conn.send("ping");
    assert_eq!(
        tokio::time::timeout(REAL_WAIT, rx.recv()).await.unwrap().as_deref(),
        Some("Message received [42]: ping")
    );
}
