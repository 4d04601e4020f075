//! Typed decode of assembly bind events
//!
//! The binder writes two events per bind operation, sharing one activity id:
//! `AssemblyBindStart` and `AssemblyBindStop`. Named payload fields are
//! decoded here once, so nothing downstream looks fields up by name.

use super::assembly::AssemblyName;
use super::envelope::TraceEvent;
use super::payload::PayloadValue;
use crate::error::{DecodeError, DecodeResult};

pub const BIND_START_EVENT: &str = "AssemblyBindStart";
pub const BIND_STOP_EVENT: &str = "AssemblyBindStop";

pub const ASSEMBLY_NAME_FIELD: &str = "AssemblyName";
pub const LOAD_CONTEXT_FIELD: &str = "AssemblyLoadContext";
pub const SUCCESS_FIELD: &str = "Success";

/// Payload of a bind start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindStart {
    pub assembly_name: AssemblyName,
    pub load_context: String,
}

/// Payload of a bind stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindStop {
    pub success: bool,
}

/// A decoded bind event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindEvent {
    Start(BindStart),
    Stop(BindStop),
}

impl BindEvent {
    /// Decode a bind event.
    ///
    /// Returns `Ok(None)` for event names other than bind start/stop. A
    /// recognized event with a missing or mistyped field is an error.
    pub fn decode(event: &TraceEvent) -> DecodeResult<Option<Self>> {
        match event.name.as_str() {
            BIND_START_EVENT => {
                let assembly_name: AssemblyName =
                    required(event, ASSEMBLY_NAME_FIELD)?.to_string().parse()?;
                let load_context = required(event, LOAD_CONTEXT_FIELD)?.to_string();
                Ok(Some(BindEvent::Start(BindStart {
                    assembly_name,
                    load_context,
                })))
            }
            BIND_STOP_EVENT => {
                let value = required(event, SUCCESS_FIELD)?;
                let success = value.as_bool().ok_or_else(|| DecodeError::FieldType {
                    event: event.name.clone(),
                    field: SUCCESS_FIELD,
                    expected: "bool",
                    found: value.type_name(),
                })?;
                Ok(Some(BindEvent::Stop(BindStop { success })))
            }
            _ => Ok(None),
        }
    }
}

fn required<'a>(event: &'a TraceEvent, field: &'static str) -> DecodeResult<&'a PayloadValue> {
    event.field(field).ok_or_else(|| DecodeError::MissingField {
        event: event.name.clone(),
        field,
    })
}
