use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::SynthError;
use super::format::LiteralWriter;
use super::pick::narrow;
use super::title::{snake_ident, title};
use crate::event::CapturedEvent;
use crate::trace::DependencyTrace;
use crate::util::json::set_path;

/// Layout of synthesized test source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthOptions {
    /// Spaces per nesting level
    pub indent: usize,
    /// Widest line a condensed literal may produce
    pub line_width: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            line_width: 80,
        }
    }
}

/// Turns a run of captured events into a standalone `#[test]` function.
///
/// The generated test expects `isolate`, `Message`, `Command` and `json!` in
/// scope, plus a function named after the container (snake_case) that
/// returns its definition.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    options: SynthOptions,
}

impl Synthesizer {
    pub fn new(options: SynthOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SynthOptions {
        self.options
    }

    /// Synthesizes a test reproducing `events` in order.
    ///
    /// With `traces`, every emitted structure is narrowed to the paths the
    /// updaters read: state and relay by the union of all traces, each
    /// message's data by its own trace. `None` and an empty slice both mean
    /// no narrowing.
    pub fn synthesize(
        &self,
        events: &[CapturedEvent],
        traces: Option<&[DependencyTrace]>,
    ) -> Result<String, SynthError> {
        let (first, last) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(SynthError::EmptyBatch),
        };

        let traces = traces.filter(|traces| !traces.is_empty());
        let aggregate = traces.map(|traces| DependencyTrace::aggregate(traces));
        let writer = LiteralWriter::new(self.options.indent, self.options.line_width);

        let title = title(events.iter().map(|event| event.message.as_str()));
        let initial_state = match &aggregate {
            Some(trace) => narrow(&first.prev, &trace.model),
            None => first.prev.clone(),
        };
        let final_base = match &aggregate {
            Some(trace) => narrow(&last.prev, &trace.model),
            None => last.prev.clone(),
        };
        let final_state = set_path(final_base, &last.path, last.next.clone())?;

        let relay = relay_argument(first, aggregate.as_ref());
        let has_commands = events.iter().any(CapturedEvent::has_commands);
        let level = if events.len() == 1 { 1 } else { 2 };
        let messages: Vec<String> = events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                let trace = traces.and_then(|traces| traces.get(index));
                self.message_expr(event, trace, &writer, level)
            })
            .collect();

        let pad = writer.pad(1);
        let mut lines = vec![
            "#[test]".to_string(),
            format!("fn should_respond_to_{}_messages() {{", snake_ident(&title)),
            format!("{pad}// {title}"),
        ];

        let mut isolate = format!("{pad}let mut container = isolate({}())", snake_ident(&first.name));
        if !first.path.is_empty() {
            let segments: Vec<String> = first.path.iter().map(|s| format!("{s:?}")).collect();
            isolate.push_str(&format!(".at([{}])", segments.join(", ")));
        }
        if let Some(relay) = &relay {
            isolate.push_str(&format!(".with_relay(json!({}))", writer.render(relay, 1)));
        }
        isolate.push(';');
        lines.push(isolate);
        lines.push(format!("{pad}container.push(json!({}));", writer.render(&initial_state, 1)));

        let assign = if has_commands { "let commands = " } else { "" };
        match messages.as_slice() {
            [single] => lines.push(format!("{pad}{assign}container.dispatch({}).unwrap();", single.trim_start())),
            many => {
                lines.push(format!("{pad}{assign}container.dispatch_all(["));
                lines.extend(many.iter().map(|message| format!("{message},")));
                lines.push(format!("{pad}]).unwrap();"));
            }
        }
        lines.push(String::new());

        if has_commands {
            let inner = writer.pad(2);
            lines.push(format!("{pad}assert_eq!(commands, vec!["));
            for event in events.iter().filter(|event| event.has_commands()) {
                for command in &event.commands {
                    lines.push(format!(
                        "{inner}Command::new({:?}, json!({})),",
                        command.0,
                        writer.render(&command.1, 2)
                    ));
                }
            }
            lines.push(format!("{pad}]);"));
        }

        lines.push(format!(
            "{pad}assert_eq!(container.state(), json!({}));",
            writer.render(&final_state, 1)
        ));
        lines.push("}".to_string());

        tracing::debug!(events = events.len(), traced = traces.is_some(), "Synthesized test");
        Ok(lines.join("\n"))
    }

    /// `Message::new(..)` for one event, indented at `level`.
    fn message_expr(
        &self,
        event: &CapturedEvent,
        trace: Option<&DependencyTrace>,
        writer: &LiteralWriter,
        level: usize,
    ) -> String {
        let data = match trace {
            Some(trace) => {
                let data = if event.data.is_null() {
                    Value::Object(Map::new())
                } else {
                    event.data.clone()
                };
                narrow(&data, &trace.message)
            }
            None => event.data.clone(),
        };

        format!(
            "{}Message::new({:?}, json!({}))",
            writer.pad(level),
            event.message,
            writer.render(&data, level)
        )
    }
}

/// Relay passed to `isolate`: present only when the first event carried a
/// non-empty relay object that the traced updaters read (or nothing was
/// traced at all).
fn relay_argument(first: &CapturedEvent, aggregate: Option<&DependencyTrace>) -> Option<Value> {
    let non_empty = first.relay.as_object().is_some_and(|relay| !relay.is_empty());
    if !non_empty {
        return None;
    }

    match aggregate {
        None => Some(first.relay.clone()),
        Some(trace) if trace.relay.is_empty() => None,
        Some(trace) => Some(narrow(&first.relay, &trace.relay)),
    }
}

/// Synthesizes with default options.
pub fn synthesize(events: &[CapturedEvent], traces: Option<&[DependencyTrace]>) -> Result<String, SynthError> {
    Synthesizer::default().synthesize(events, traces)
}
