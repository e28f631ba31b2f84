//! Integration tests for the capture flow
//!
//! Tests the flow: runtime dispatch -> Instrumenter -> backends, plus the
//! requests backends send back (queries, dispatch by name, time travel).

use serde_json::json;
use statelens::instrument::{OutboundMessage, STATE_INITIALIZED};
use statelens::{ChannelBackend, Instrumenter, Message};

use super::common::containers::{counter, todo_list};
use super::common::runtime::{collecting_backend, event_names, TestApp};

/// Test that events reach a connected backend in dispatch order
#[test]
fn test_events_delivered_in_order() {
    let instrumenter = Instrumenter::new();
    let (control, received) = collecting_backend(&instrumenter, "collector");
    control.connect();

    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    let counter_ctx = app.mount("counter-1", counter(), &["counter"], json!({}));
    app.dispatch(&counter_ctx, Message::new("Increment", json!({ "step": 2 })));
    app.dispatch(&counter_ctx, Message::new("Decrement", json!(null)));

    let received = received.lock();
    assert_eq!(
        received.first(),
        Some(&OutboundMessage::State {
            state: STATE_INITIALIZED.to_string()
        }),
        "Handshake should arrive first"
    );
    assert_eq!(
        event_names(&received),
        vec!["Init (Counter)", "Increment", "Decrement"]
    );
    assert_eq!(app.state(), json!({ "counter": { "count": 1 } }));
}

/// Test that event ids share the session token and never repeat
#[test]
fn test_event_ids_are_unique() {
    let instrumenter = Instrumenter::new();
    let (control, received) = collecting_backend(&instrumenter, "collector");
    control.connect();

    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    let ctx = app.mount("counter-1", counter(), &[], json!({}));
    for _ in 0..5 {
        app.dispatch(&ctx, Message::new("Increment", json!(null)));
    }

    let ids: Vec<String> = received
        .lock()
        .iter()
        .filter_map(OutboundMessage::as_event)
        .map(|event| event.id.clone())
        .collect();
    let unique: std::collections::HashSet<_> = ids.iter().collect();

    assert_eq!(ids.len(), 6);
    assert_eq!(unique.len(), ids.len(), "Event ids must be unique");
    assert!(ids.iter().all(|id| id.starts_with(instrumenter.session())));
}

/// Test that a disconnected backend queues while others keep receiving
#[test]
fn test_disconnected_backend_queues_independently() {
    let instrumenter = Instrumenter::new();
    let (live, live_received) = collecting_backend(&instrumenter, "live");
    let (slow, slow_received) = collecting_backend(&instrumenter, "slow");
    live.connect();

    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    let ctx = app.mount("counter-1", counter(), &[], json!({}));
    app.dispatch(&ctx, Message::new("Increment", json!(null)));

    assert_eq!(event_names(&live_received.lock()).len(), 2);
    assert!(event_names(&slow_received.lock()).is_empty());
    assert_eq!(instrumenter.queued("slow"), 2);

    slow.connect();
    app.dispatch(&ctx, Message::new("Increment", json!(null)));
    slow.disconnect();
    app.dispatch(&ctx, Message::new("Decrement", json!(null)));

    assert_eq!(
        event_names(&slow_received.lock()),
        vec!["Init (Counter)", "Increment", "Increment"]
    );
    assert_eq!(instrumenter.queued("slow"), 1);
    assert_eq!(instrumenter.is_connected("slow"), Some(false));

    slow.connect();
    assert_eq!(
        event_names(&slow_received.lock()),
        vec!["Init (Counter)", "Increment", "Increment", "Decrement"]
    );
    assert_eq!(event_names(&live_received.lock()).len(), 4);
}

/// Test that message-name queries span every mounted container
#[test]
fn test_message_name_queries() {
    let instrumenter = Instrumenter::new();
    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    app.mount("counter-1", counter(), &["counter"], json!({}));
    app.mount("counter-2", counter(), &["other"], json!({}));
    app.mount("todos-1", todo_list(), &["todos"], json!({}));

    assert_eq!(instrumenter.containers_handling("Increment"), vec!["Counter"]);
    assert_eq!(instrumenter.containers_handling("Toggle"), vec!["TodoList"]);

    let names = instrumenter.message_names("");
    assert_eq!(
        names.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["AddTodo", "Decrement", "Increment", "Save", "Toggle"]
    );
    assert_eq!(names["Save"], vec!["Counter"]);
}

/// Test that a backend can dispatch by name into a live container
#[test]
fn test_dispatch_by_name_round_trip() {
    let instrumenter = Instrumenter::new();
    let (control, received) = collecting_backend(&instrumenter, "observer");
    control.connect();

    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    app.mount("todos-1", todo_list(), &["todos"], json!({}));

    control
        .send(json!({ "dispatch": { "name": "TodoList", "message": "AddTodo", "data": { "title": "write tests" } } }))
        .expect("Dispatch request should be accepted");
    assert_eq!(app.run_pending(), 1);

    assert_eq!(
        app.state(),
        json!({ "todos": { "items": [{ "title": "write tests", "done": false }] } })
    );
    assert_eq!(
        event_names(&received.lock()),
        vec!["Init (TodoList)", "AddTodo"]
    );
}

/// Test that selecting an event restores the state it produced
#[test]
fn test_time_travel_restores_selected_state() {
    let instrumenter = Instrumenter::new();
    let (control, received) = collecting_backend(&instrumenter, "observer");
    control.connect();

    let mut app = TestApp::new(instrumenter.clone(), json!({ "title": "demo" }));
    let ctx = app.mount("counter-1", counter(), &["counter"], json!({}));
    app.dispatch(&ctx, Message::new("Increment", json!({ "step": 5 })));
    app.dispatch(&ctx, Message::new("Increment", json!({ "step": 5 })));
    assert_eq!(app.state()["counter"]["count"], 10);

    let first_increment = received
        .lock()
        .iter()
        .filter_map(OutboundMessage::as_event)
        .find(|event| event.message == "Increment")
        .cloned()
        .expect("Increment should be captured");

    control
        .send(json!({
            "selected": {
                "path": first_increment.path,
                "prev": first_increment.prev,
                "next": first_increment.next,
            }
        }))
        .unwrap();

    assert_eq!(app.state(), json!({ "title": "demo", "counter": { "count": 5 } }));
}

/// Test that the channel backend speaks JSON text end to end
#[tokio::test]
async fn test_channel_backend_frames() {
    let instrumenter = Instrumenter::new();
    let mut backend = ChannelBackend::attach(&instrumenter, "socket");

    let mut app = TestApp::new(instrumenter.clone(), json!({}));
    let ctx = app.mount("counter-1", counter(), &[], json!({}));
    app.dispatch(&ctx, Message::new("Increment", json!(null)));

    let handshake = backend.recv().await.expect("handshake frame");
    assert_eq!(handshake, r#"{"state":"initialized"}"#);

    backend.connect();
    let mut messages = Vec::new();
    for _ in 0..2 {
        let frame = backend.recv().await.expect("event frame");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        messages.push(value["message"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(messages, vec!["Init (Counter)", "Increment"]);

    backend
        .receive_text(r#"{"requestId":{"n":1},"messageNames":"Dec"}"#)
        .unwrap();
    let response: serde_json::Value =
        serde_json::from_str(&backend.recv().await.expect("response frame")).unwrap();
    assert_eq!(
        response,
        json!({ "requestId": { "n": 1 }, "messageNames": { "Decrement": ["Counter"] } })
    );
}
