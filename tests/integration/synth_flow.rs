//! Integration tests for the synthesis flow
//!
//! Tests the flow: recorded tape -> dependency traces -> synthesized test,
//! and checks that replaying the narrowed inputs through the harness lands
//! on the asserted state.

use serde_json::json;
use statelens::synth::narrow;
use statelens::tape::Tape;
use statelens::util::set_path;
use statelens::{
    isolate, synthesize, CapturedEvent, Command, DependencyTrace, Instrumenter, Message,
    TapeBackend,
};
use tempfile::TempDir;

use super::common::containers::counter;
use super::common::runtime::TestApp;

/// Records an `Increment (x3) and Save` run of the counter to a tape and
/// returns the non-init events read back from it.
fn record_counter_run(instrumenter: &std::sync::Arc<Instrumenter>, dir: &TempDir) -> Vec<CapturedEvent> {
    let tape_path = dir.path().join("tape.jsonl");
    TapeBackend::record_to(instrumenter, &tape_path).expect("Failed to create tape");

    let mut app = TestApp::new(
        instrumenter.clone(),
        json!({ "counter": { "count": 0 }, "todos": { "items": [] } }),
    );
    let ctx = app.mount(
        "counter-1",
        counter(),
        &["counter"],
        json!({ "endpoint": "/save", "theme": "dark" }),
    );
    app.dispatch(&ctx, Message::new("Increment", json!({ "step": 1 })));
    app.dispatch(&ctx, Message::new("Increment", json!({ "step": 2, "source": "button" })));
    app.dispatch(&ctx, Message::new("Increment", json!({})));
    app.dispatch(&ctx, Message::new("Save", json!(null)));

    Tape::read_jsonl_from_path(&tape_path)
        .expect("Failed to read tape")
        .events()
        .into_iter()
        .filter(|event| !event.message.starts_with("Init"))
        .collect()
}

/// Test that tracing recorded events yields the paths each updater read
#[test]
fn test_traces_from_recorded_tape() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let instrumenter = Instrumenter::new();
    let events = record_counter_run(&instrumenter, &dir);
    assert_eq!(events.len(), 4);

    let traces = instrumenter
        .dependency_traces(&events)
        .expect("Every event should resolve an updater");

    let path = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(traces[0].model.as_slice(), &[path(&["counter", "count"])]);
    assert_eq!(traces[0].message.as_slice(), &[path(&["step"])]);
    assert!(traces[0].relay.is_empty());
    assert_eq!(traces[3].relay.as_slice(), &[path(&["endpoint"])]);

    let aggregate = DependencyTrace::aggregate(&traces);
    assert_eq!(aggregate.model.len(), 1, "Model paths should be deduplicated");
}

/// Test the synthesized source for a traced run
#[test]
fn test_synthesized_source_for_traced_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let instrumenter = Instrumenter::new();
    let events = record_counter_run(&instrumenter, &dir);
    let traces = instrumenter.dependency_traces(&events).unwrap();

    let source = synthesize(&events, Some(traces.as_slice())).expect("Synthesis should succeed");

    insta::assert_snapshot!(source, @r#"
    #[test]
    fn should_respond_to_increment_x3_and_save_messages() {
        // Increment (x3) and Save
        let mut container = isolate(counter()).at(["counter"]).with_relay(json!({ "endpoint": "/save" }));
        container.push(json!({ "counter": { "count": 0 } }));
        let commands = container.dispatch_all([
            Message::new("Increment", json!({ "step": 1 })),
            Message::new("Increment", json!({ "step": 2 })),
            Message::new("Increment", json!({})),
            Message::new("Save", json!({})),
        ]).unwrap();

        assert_eq!(commands, vec![
            Command::new("Persist", json!({ "count": 4, "to": "/save" })),
        ]);
        assert_eq!(container.state(), json!({ "counter": { "count": 4 } }));
    }
    "#);
}

/// Test that the untraced form keeps every field verbatim
#[test]
fn test_synthesized_source_without_traces() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let instrumenter = Instrumenter::new();
    let events = record_counter_run(&instrumenter, &dir);

    let source = synthesize(&events, None).unwrap();

    assert!(source.contains("\"todos\": { \"items\": [] }"));
    assert!(source.contains("\"source\": \"button\""));
    assert!(source.contains("\"theme\": \"dark\""));
    assert!(source.contains("Message::new(\"Save\", json!(null))"));
}

/// Test that the synthesized steps hold when replayed through the harness
#[test]
fn test_narrowed_replay_reaches_final_state() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let instrumenter = Instrumenter::new();
    let events = record_counter_run(&instrumenter, &dir);
    let traces = instrumenter.dependency_traces(&events).unwrap();
    let aggregate = DependencyTrace::aggregate(&traces);

    let first = &events[0];
    let last = &events[events.len() - 1];

    let mut container = isolate(counter())
        .at(first.path.clone())
        .with_relay(narrow(&first.relay, &aggregate.relay));
    container.push(narrow(&first.prev, &aggregate.model));

    let messages: Vec<Message> = events
        .iter()
        .zip(&traces)
        .map(|(event, trace)| {
            let data = if event.data.is_null() { json!({}) } else { event.data.clone() };
            Message::new(event.message.clone(), narrow(&data, &trace.message))
        })
        .collect();
    let commands = container.dispatch_all(messages).unwrap();

    assert_eq!(
        commands,
        vec![Command::new("Persist", json!({ "to": "/save", "count": 4 }))]
    );
    assert_eq!(
        container.state(),
        set_path(narrow(&last.prev, &aggregate.model), &last.path, last.next.clone()).unwrap()
    );
}
