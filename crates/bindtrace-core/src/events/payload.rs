//! Payload values carried by trace events

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single named payload value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PayloadValue {
    Str(String),
    Bool(bool),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    Guid(Uuid),
}

impl PayloadValue {
    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Str(_) => "string",
            PayloadValue::Bool(_) => "bool",
            PayloadValue::U16(_) => "u16",
            PayloadValue::U32(_) => "u32",
            PayloadValue::U64(_) => "u64",
            PayloadValue::I32(_) => "i32",
            PayloadValue::I64(_) => "i64",
            PayloadValue::Guid(_) => "guid",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PayloadValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadValue::Str(s) => f.write_str(s),
            PayloadValue::Bool(b) => write!(f, "{}", b),
            PayloadValue::U16(n) => write!(f, "{}", n),
            PayloadValue::U32(n) => write!(f, "{}", n),
            PayloadValue::U64(n) => write!(f, "{}", n),
            PayloadValue::I32(n) => write!(f, "{}", n),
            PayloadValue::I64(n) => write!(f, "{}", n),
            PayloadValue::Guid(g) => write!(f, "{}", g),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Str(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Str(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<u16> for PayloadValue {
    fn from(value: u16) -> Self {
        PayloadValue::U16(value)
    }
}

impl From<u32> for PayloadValue {
    fn from(value: u32) -> Self {
        PayloadValue::U32(value)
    }
}

impl From<u64> for PayloadValue {
    fn from(value: u64) -> Self {
        PayloadValue::U64(value)
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        PayloadValue::I32(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::I64(value)
    }
}

impl From<Uuid> for PayloadValue {
    fn from(value: Uuid) -> Self {
        PayloadValue::Guid(value)
    }
}
