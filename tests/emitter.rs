//! Named events through a client over a scripted transport.

mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use notify_client::{
    AppMessage, Client, Error, JsonCodec, TransportEvent, WILDCARD_EVENT, encode_batch,
};

use common::{Recorded, Recorder, ScriptedTransport, init_tracing, settle};

// ============================================================================
// Helpers
// ============================================================================

fn client() -> (Client, ScriptedTransport) {
    init_tracing();
    let transport = ScriptedTransport::new();
    let client = Client::builder()
        .transport(transport.clone())
        .auth("secret")
        .build()
        .expect("client builds");
    (client, transport)
}

async fn open(client: &Client, transport: &ScriptedTransport) {
    client.connect();
    settle().await;
    transport.fire(TransportEvent::Open);
    transport.fire(TransportEvent::Auth(Ok(())));
    settle().await;
}

fn message(name: &str, args: Vec<Value>) -> Vec<u8> {
    AppMessage::new(name, args)
        .encode(&JsonCodec)
        .expect("message encodes")
}

type Seen = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

fn collect(client: &Client, name: &str) -> Seen {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    client.on(name, move |name, args| {
        sink.lock().push((name.to_string(), args.to_vec()));
    });
    seen
}

// ============================================================================
// Outgoing
// ============================================================================

#[tokio::test]
async fn test_emit_before_open_is_flushed_with_exact_bytes() {
    let (client, transport) = client();

    client.emit("foo", &[json!(1), json!("bar")]).unwrap();
    assert_eq!(client.queued(), 1);
    assert!(transport.sent().is_empty());

    open(&client, &transport).await;

    let expected: &[u8] = b"\x03foo\x01\x001\x05\x00\"bar\"";
    assert_eq!(transport.sent(), vec![expected.to_vec()]);
}

#[tokio::test]
async fn test_emit_long_name_fails_locally() {
    let (client, transport) = client();
    open(&client, &transport).await;

    let err = client.emit(&"n".repeat(256), &[json!(1)]).unwrap_err();
    assert!(matches!(err, Error::EventNameTooLong { len: 256 }));
    assert!(transport.sent().is_empty());
    assert_eq!(client.queued(), 0);
}

#[tokio::test]
async fn test_emit_name_at_limit_is_sent() {
    let (client, transport) = client();
    open(&client, &transport).await;

    client.emit(&"n".repeat(255), &[]).unwrap();
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0], 255);
    assert_eq!(sent[0].len(), 256);
}

#[tokio::test]
async fn test_emit_oversized_argument_fails_locally() {
    let (client, transport) = client();
    open(&client, &transport).await;

    let big = json!("x".repeat(70_000));
    let err = client.emit("big", &[big]).unwrap_err();
    assert!(matches!(err, Error::ArgumentTooLong { .. }));
    assert!(transport.sent().is_empty());
}

// ============================================================================
// Incoming
// ============================================================================

#[tokio::test]
async fn test_incoming_batch_dispatched_by_name() {
    let (client, transport) = client();
    let foo = collect(&client, "foo");
    let bar = collect(&client, "bar");
    open(&client, &transport).await;

    let batch = encode_batch([
        message("foo", vec![json!(1), json!("bar")]),
        message("bar", vec![]),
        message("foo", vec![json!({ "k": true })]),
    ])
    .unwrap();
    transport.fire(TransportEvent::Message(batch));
    settle().await;

    let foo = foo.lock();
    assert_eq!(foo.len(), 2);
    assert_eq!(foo[0].1, vec![json!(1), json!("bar")]);
    assert_eq!(foo[1].1, vec![json!({ "k": true })]);
    assert_eq!(bar.lock().len(), 1);
}

#[tokio::test]
async fn test_decode_error_skips_only_that_entry() {
    let (client, transport) = client();
    let mut recorder = Recorder::attach(client.session());
    let foo = collect(&client, "foo");
    open(&client, &transport).await;

    let batch = encode_batch([
        message("foo", vec![json!(1)]),
        b"\x09trunc".to_vec(),
        message("foo", vec![json!(2)]),
    ])
    .unwrap();
    transport.fire(TransportEvent::Message(batch));
    settle().await;

    let args: Vec<Vec<Value>> = foo.lock().iter().map(|(_, a)| a.clone()).collect();
    assert_eq!(args, vec![vec![json!(1)], vec![json!(2)]]);

    let errors: Vec<Recorded> = recorder.drain().into_iter().filter(Recorded::is_error).collect();
    match errors.as_slice() {
        [Recorded::Error { decode: true, .. }] => {}
        other => panic!("expected one decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wildcard_receives_unhandled_events() {
    let (client, transport) = client();
    let named = collect(&client, "known");
    let wildcard = collect(&client, WILDCARD_EVENT);
    open(&client, &transport).await;

    let batch = encode_batch([
        message("known", vec![json!(1)]),
        message("other", vec![json!("x")]),
    ])
    .unwrap();
    transport.fire(TransportEvent::Message(batch));
    settle().await;

    assert_eq!(named.lock().len(), 1);
    let wildcard = wildcard.lock();
    assert_eq!(wildcard.len(), 1);
    assert_eq!(wildcard[0], ("other".to_string(), vec![json!("x")]));
}

#[tokio::test]
async fn test_off_stops_delivery() {
    let (client, transport) = client();
    let calls = Arc::new(Mutex::new(0_usize));

    let counter = Arc::clone(&calls);
    let id = client.on("foo", move |_, _| *counter.lock() += 1);
    let kept = collect(&client, "foo");
    open(&client, &transport).await;

    assert!(client.off("foo", id));
    transport.fire(TransportEvent::Message(
        encode_batch([message("foo", vec![])]).unwrap(),
    ));
    settle().await;

    assert_eq!(*calls.lock(), 0);
    assert_eq!(kept.lock().len(), 1);
}

#[tokio::test]
async fn test_handler_may_emit_reentrantly() {
    let (client, transport) = client();
    let responder = client.clone();
    client.on("ping", move |_, args| {
        responder.emit("pong", args).expect("reply encodes");
    });
    open(&client, &transport).await;

    let batch = encode_batch([message("ping", vec![json!(7)])]).unwrap();
    transport.fire(TransportEvent::Message(batch));
    settle().await;

    let expected = message("pong", vec![json!(7)]);
    assert_eq!(transport.sent(), vec![expected]);
}
