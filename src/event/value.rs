//! Typed attribute and extension values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of an attribute or extension.
///
/// String-only transports (HTTP headers) carry the [`Display`](fmt::Display)
/// form and read every value back as [`Value::String`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed 32-bit integer.
    Integer(i32),
    /// A string; URIs and timestamps are carried in this form.
    String(String),
}

impl Value {
    /// Borrow the value as a string slice when it is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Value::String(value.to_owned()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Value::String(value) }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Value::Bool(value) }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self { Value::Integer(value) }
}
