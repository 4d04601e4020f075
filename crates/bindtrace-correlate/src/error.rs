//! Error types for bindtrace-correlate

use bindtrace_core::{ActivityId, DecodeError};
use thiserror::Error;

/// A binder event sequence that cannot be correlated
///
/// Either the provider or the correlator is broken; a session never
/// repairs one of these.
#[derive(Debug, Error)]
pub enum ProtocolViolation {
    #[error("AssemblyBindStart repeated for activity {0}")]
    DuplicateStart(ActivityId),

    #[error("AssemblyBindStop for activity {0} has no matching AssemblyBindStart")]
    StopWithoutStart(ActivityId),

    #[error("AssemblyBindStop repeated for activity {0}")]
    DuplicateStop(ActivityId),

    #[error("Malformed binder event for activity {activity}: {source}")]
    Malformed {
        activity: ActivityId,
        #[source]
        source: DecodeError,
    },
}

impl ProtocolViolation {
    /// Activity id the violation was detected on
    pub fn activity(&self) -> ActivityId {
        match self {
            ProtocolViolation::DuplicateStart(id)
            | ProtocolViolation::StopWithoutStart(id)
            | ProtocolViolation::DuplicateStop(id) => *id,
            ProtocolViolation::Malformed { activity, .. } => *activity,
        }
    }
}

/// Result type for correlation
pub type CorrelateResult<T> = Result<T, ProtocolViolation>;
