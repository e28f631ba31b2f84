//! Container definitions used across integration tests

use std::sync::Arc;

use serde_json::{json, Value};
use statelens::{Cmd, ContainerDefinition, Update};

/// Counter whose model is `{ "count": n }`.
///
/// - `Increment` reads `count` and `step` (default 1)
/// - `Decrement` reads `count`
/// - `Save` reads `count` and the relay's `endpoint`, emitting `Persist`
pub fn counter() -> Arc<ContainerDefinition> {
    Arc::new(
        ContainerDefinition::new("Counter")
            .on("Increment", |model, data, _relay| {
                let count = model.get_i64("count").unwrap_or(0);
                let step = data.get_i64("step").unwrap_or(1);
                json!({ "count": count + step })
            })
            .on("Decrement", |model, _data, _relay| {
                json!({ "count": model.get_i64("count").unwrap_or(0) - 1 })
            })
            .on("Save", |model, _data, relay| {
                let count = model.get_i64("count").unwrap_or(0);
                let endpoint = relay.get_str("endpoint").unwrap_or("/").to_string();
                Update::new(json!({ "count": count }))
                    .with_command(Cmd::run("Persist", json!({ "to": endpoint, "count": count })))
            }),
    )
}

/// Todo list whose model is `{ "items": [{ "title", "done" }] }`.
pub fn todo_list() -> Arc<ContainerDefinition> {
    Arc::new(
        ContainerDefinition::new("TodoList")
            .on("AddTodo", |model, data, _relay| {
                let mut items = model
                    .get("items")
                    .map(|items| items.to_value())
                    .and_then(|items| items.as_array().cloned())
                    .unwrap_or_default();
                let title = data.get_str("title").unwrap_or_default();
                items.push(json!({ "title": title, "done": false }));
                json!({ "items": items })
            })
            .on("Toggle", |model, data, _relay| {
                let index = data.get_i64("index").unwrap_or(0);
                let mut next = json!({ "items": [] });
                if let Some(items) = model.get("items") {
                    let mut copied: Vec<Value> = Vec::new();
                    for i in 0..items.len() {
                        let Some(item) = items.index(i) else { continue };
                        let mut item_value = item.to_value();
                        if i as i64 == index {
                            let done = item.get_bool("done").unwrap_or(false);
                            item_value["done"] = json!(!done);
                        }
                        copied.push(item_value);
                    }
                    next = json!({ "items": copied });
                }
                Update::new(next).with_command(Cmd::batch([
                    Cmd::run("Log", json!(format!("toggled {index}"))),
                    Cmd::None,
                ]))
            }),
    )
}
