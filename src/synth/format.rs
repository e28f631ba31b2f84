//! Renders JSON values as `serde_json::json!` literal bodies.

use serde_json::Value;

/// Writes values with sorted keys, condensing any object or array onto a
/// single line when it fits within `line_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralWriter {
    pub indent: usize,
    pub line_width: usize,
}

impl Default for LiteralWriter {
    fn default() -> Self {
        Self {
            indent: 4,
            line_width: 80,
        }
    }
}

impl LiteralWriter {
    pub fn new(indent: usize, line_width: usize) -> Self {
        Self { indent, line_width }
    }

    /// Renders `value` as if its first character sits at nesting `level`.
    /// Continuation lines are indented relative to that level.
    pub fn render(&self, value: &Value, level: usize) -> String {
        let inline = inline(value);
        if !is_nonempty_container(value) || self.pad(level).len() + inline.len() <= self.line_width {
            return inline;
        }

        let inner = self.pad(level + 1);
        let items: Vec<String> = match value {
            Value::Object(map) => sorted(map)
                .into_iter()
                .map(|(key, child)| format!("{inner}{key:?}: {},", self.render(child, level + 1)))
                .collect(),
            Value::Array(items) => items
                .iter()
                .map(|child| format!("{inner}{},", self.render(child, level + 1)))
                .collect(),
            _ => Vec::new(),
        };

        let (open, close) = match value {
            Value::Array(_) => ('[', ']'),
            _ => ('{', '}'),
        };
        format!("{open}\n{}\n{}{close}", items.join("\n"), self.pad(level))
    }

    /// Leading whitespace for nesting `level`.
    pub fn pad(&self, level: usize) -> String {
        " ".repeat(self.indent * level)
    }
}

fn inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(inline).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries: Vec<String> = sorted(map)
                .into_iter()
                .map(|(key, child)| format!("{key:?}: {}", inline(child)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

fn sorted(map: &serde_json::Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn is_nonempty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}
