//! Error types for bindtrace-core

use thiserror::Error;

/// Errors decoding a trace event payload into a typed event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{event} is missing payload field {field}")]
    MissingField { event: String, field: &'static str },

    #[error("{event} field {field}: expected {expected}, found {found}")]
    FieldType {
        event: String,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid assembly name: {0:?}")]
    InvalidAssemblyName(String),
}

/// Result type for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DecodeError::MissingField {
            event: "AssemblyBindStop".to_string(),
            field: "Success",
        };
        assert_eq!(err.to_string(), "AssemblyBindStop is missing payload field Success");

        let err = DecodeError::InvalidAssemblyName(String::new());
        assert_eq!(err.to_string(), "Invalid assembly name: \"\"");
    }
}
