//! In-process trace provider
//!
//! Stands in for the runtime's event pipeline: [`TraceHub`] discovers
//! sources, applies per-listener level/keyword filters and related-id
//! propagation, and [`BindEmitter`] / [`BindEventGenerator`] write binder
//! events into it.

use thiserror::Error;

pub mod emitter;
pub mod generator;
pub mod hub;

pub use emitter::BindEmitter;
pub use generator::{BindEventGenerator, GeneratorConfig, GeneratorStats};
pub use hub::{HubConfig, HubStats, TraceHub};

/// Capture error type
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Generator already running")]
    AlreadyRunning,

    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
