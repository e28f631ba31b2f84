//! Wire shapes exchanged with backends.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::InstrumentError;
use crate::event::CapturedEvent;

/// Handshake state sent to every backend right after registration.
pub const STATE_INITIALIZED: &str = "initialized";

/// Messages sent TO a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Event(CapturedEvent),
    Containers {
        #[serde(rename = "requestId", default)]
        request_id: Value,
        containers: Vec<String>,
    },
    MessageNames {
        #[serde(rename = "requestId", default)]
        request_id: Value,
        #[serde(rename = "messageNames")]
        message_names: BTreeMap<String, Vec<String>>,
    },
    State {
        state: String,
    },
}

impl OutboundMessage {
    pub fn initialized() -> Self {
        OutboundMessage::State {
            state: STATE_INITIALIZED.to_string(),
        }
    }

    pub fn as_event(&self) -> Option<&CapturedEvent> {
        match self {
            OutboundMessage::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// The part of a selected event needed to restore its resulting state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectedState {
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub prev: Value,
    #[serde(default)]
    pub next: Value,
}

/// A request to build and dispatch a message by name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DispatchRequest {
    /// Container name
    pub name: String,
    /// Message type name
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// Messages received FROM a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Time travel to the state produced by a captured event
    Selected(SelectedState),
    Dispatch(DispatchRequest),
    /// Which containers handle the named message
    ContainersHandling { request_id: Value, message: String },
    /// Message names starting with a prefix, with their containers
    MessageNames { request_id: Value, prefix: String },
    /// Connection state notification
    State(String),
}

impl InboundMessage {
    /// Classifies a payload by its shape; the first matching key wins, in the
    /// order `selected`, `dispatch`, `containersHandling`, `messageNames`,
    /// `state`.
    pub fn from_value(value: Value) -> Result<Self, InstrumentError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(InstrumentError::InvalidInboundMessage(format!(
                    "expected an object, got {other}"
                )))
            }
        };

        if let Some(selected) = map.remove("selected") {
            return parse("selected", selected).map(InboundMessage::Selected);
        }

        if let Some(dispatch) = map.remove("dispatch") {
            return parse("dispatch", dispatch).map(InboundMessage::Dispatch);
        }

        if let Some(message) = map.remove("containersHandling") {
            return Ok(InboundMessage::ContainersHandling {
                message: parse("containersHandling", message)?,
                request_id: request_id(&mut map),
            });
        }

        if let Some(prefix) = map.remove("messageNames") {
            return Ok(InboundMessage::MessageNames {
                prefix: parse("messageNames", prefix)?,
                request_id: request_id(&mut map),
            });
        }

        if let Some(state) = map.remove("state") {
            let state = match state {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Ok(InboundMessage::State(state));
        }

        Err(InstrumentError::InvalidInboundMessage(format!(
            "unrecognized keys: {:?}",
            map.keys().collect::<Vec<_>>()
        )))
    }
}

fn parse<T: DeserializeOwned>(field: &str, value: Value) -> Result<T, InstrumentError> {
    serde_json::from_value(value)
        .map_err(|err| InstrumentError::InvalidInboundMessage(format!("malformed `{field}`: {err}")))
}

fn request_id(map: &mut Map<String, Value>) -> Value {
    map.remove("requestId").unwrap_or(Value::Null)
}
