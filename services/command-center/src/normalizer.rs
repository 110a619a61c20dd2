//! Error payload normalization
//!
//! The target API reports failures in several JSON shapes. They are
//! classified into [`ErrorShape`] and reduced to one message plus an
//! optional hint naming the offending field.

use serde_json::Value;

/// Message used when no recognized field carries one
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Recognized error payload shapes, in precedence order
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorShape<'a> {
    /// The payload is a bare string
    Text(&'a str),
    /// `detail` is a non-empty list (validation errors)
    DetailList(&'a [Value]),
    /// `detail` is anything else
    DetailScalar(&'a Value),
    Message(&'a Value),
    Error(&'a Value),
    Msg(&'a Value),
    Unknown,
}

impl<'a> ErrorShape<'a> {
    pub fn classify(payload: &'a Value) -> Self {
        let object = match payload {
            Value::String(text) => return ErrorShape::Text(text),
            Value::Object(object) => object,
            _ => return ErrorShape::Unknown,
        };

        match field(payload, "detail") {
            Some(Value::Array(items)) if !items.is_empty() => {
                return ErrorShape::DetailList(items);
            }
            Some(Value::Array(_)) => {}
            Some(detail) => return ErrorShape::DetailScalar(detail),
            None => {}
        }

        if let Some(message) = field(payload, "message") {
            ErrorShape::Message(message)
        } else if let Some(error) = field(payload, "error") {
            ErrorShape::Error(error)
        } else if let Some(msg) = field(payload, "msg") {
            ErrorShape::Msg(msg)
        } else {
            tracing::debug!(
                "Unrecognized error payload with keys {:?}",
                object.keys().collect::<Vec<_>>()
            );
            ErrorShape::Unknown
        }
    }

    pub fn message(&self) -> String {
        match self {
            ErrorShape::Text(text) => text.to_string(),
            ErrorShape::DetailList(items) => {
                let first = &items[0];
                field(first, "msg")
                    .or_else(|| field(first, "message"))
                    .map(stringify)
                    .unwrap_or_else(|| stringify(first))
            }
            ErrorShape::DetailScalar(value)
            | ErrorShape::Message(value)
            | ErrorShape::Error(value)
            | ErrorShape::Msg(value) => stringify(value),
            ErrorShape::Unknown => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn hint(&self) -> Option<String> {
        let ErrorShape::DetailList(items) = self else {
            return None;
        };
        match field(&items[0], "loc") {
            Some(Value::Array(loc)) => loc.last().map(stringify),
            _ => None,
        }
    }
}

/// Human readable summary of an error payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub message: String,
    pub hint: Option<String>,
}

pub fn normalize(payload: &Value) -> NormalizedError {
    let shape = ErrorShape::classify(payload);
    NormalizedError {
        message: shape.message(),
        hint: shape.hint(),
    }
}

/// A present, non-null field of an object
fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
