//! Integration tests for the `statelens` binary
//!
//! Each test points `--data-dir` at a temporary directory so logs and config
//! never touch the real home directory.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use statelens::instrument::OutboundMessage;
use statelens::{CapturedEvent, SerializedCommand, TapeWriter};
use tempfile::TempDir;

fn event(id: &str, message: &str, prev: i64, step: i64) -> CapturedEvent {
    CapturedEvent {
        id: id.to_string(),
        ts: 1_700_000_000_000,
        context: "counter-1".to_string(),
        name: "Counter".to_string(),
        message: message.to_string(),
        data: json!({ "step": step }),
        prev: json!({ "count": prev }),
        next: json!({ "count": prev + step }),
        path: Vec::new(),
        relay: json!({}),
        commands: Vec::new(),
    }
}

/// Writes a tape holding a handshake and three counter events.
fn write_tape(path: &Path) {
    let writer = TapeWriter::create(path).expect("Failed to create tape");
    writer.record(OutboundMessage::initialized()).unwrap();
    writer
        .record(OutboundMessage::Event(event("s1", "Increment", 0, 1)))
        .unwrap();
    writer
        .record(OutboundMessage::Event(event("s2", "Increment", 1, 2)))
        .unwrap();

    let mut save = event("s3", "Save", 3, 0);
    save.commands = vec![SerializedCommand("Persist".into(), json!({ "count": 3 }))];
    writer.record(OutboundMessage::Event(save)).unwrap();
}

fn statelens(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("statelens").expect("binary should build");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

/// Test that `list` prints one line per captured event
#[test]
fn test_list_prints_events() {
    let dir = TempDir::new().unwrap();
    let tape = dir.path().join("tape.jsonl");
    write_tape(&tape);

    statelens(&dir)
        .args(["list", "--tape"])
        .arg(&tape)
        .assert()
        .success()
        .stdout(predicate::str::contains("s1  Counter Increment"))
        .stdout(predicate::str::contains("s3  Counter Save (1 command)"))
        .stdout(predicate::str::contains("state").not());
}

/// Test that `synth` honors the index range
#[test]
fn test_synth_range() {
    let dir = TempDir::new().unwrap();
    let tape = dir.path().join("tape.jsonl");
    write_tape(&tape);

    statelens(&dir)
        .args(["synth", "--from", "0", "--to", "1", "--tape"])
        .arg(&tape)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "fn should_respond_to_increment_x2_messages() {",
        ))
        .stdout(predicate::str::contains("assert_eq!(container.state(), json!({ \"count\": 3 }));"))
        .stdout(predicate::str::contains("commands").not());
}

/// Test that `synth --id` selects events and applies supplied traces
#[test]
fn test_synth_by_id_with_traces() {
    let dir = TempDir::new().unwrap();
    let tape = dir.path().join("tape.jsonl");
    write_tape(&tape);

    let traces = dir.path().join("traces.json");
    std::fs::write(
        &traces,
        json!([{ "model": [["count"]], "message": [], "relay": [] }]).to_string(),
    )
    .unwrap();

    statelens(&dir)
        .args(["synth", "--id", "s3", "--tape"])
        .arg(&tape)
        .arg("--traces")
        .arg(&traces)
        .assert()
        .success()
        .stdout(predicate::str::contains("// Save"))
        .stdout(predicate::str::contains("Message::new(\"Save\", json!({}))"))
        .stdout(predicate::str::contains("Command::new(\"Persist\", json!({ \"count\": 3 }))"));
}

/// Test that selecting nothing is an error
#[test]
fn test_synth_with_no_events_fails() {
    let dir = TempDir::new().unwrap();
    let tape = dir.path().join("tape.jsonl");
    write_tape(&tape);

    statelens(&dir)
        .args(["synth", "--id", "missing", "--tape"])
        .arg(&tape)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no events selected"));
}

/// Test that `config set` persists values shown by `config`
#[test]
fn test_config_set_and_show() {
    let dir = TempDir::new().unwrap();

    statelens(&dir)
        .args(["config", "set", "synth.indent", "2"])
        .assert()
        .success();

    statelens(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("indent = 2"))
        .stdout(predicate::str::contains("line_width = 80"));

    statelens(&dir)
        .args(["config", "set", "synth.colour", "blue"])
        .assert()
        .failure();
}
