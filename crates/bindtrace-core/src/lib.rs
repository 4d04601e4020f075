//! bindtrace core - trace event model, listener traits and configuration
//!
//! This crate provides the foundational types shared by the provider and
//! the correlator:
//!
//! - **Events**: the provider's structured [`TraceEvent`] record and the
//!   typed [`BindEvent`] decoded from it
//! - **Source**: listener/provider traits and per-source subscriptions
//! - **Config**: TOML configuration with env overrides
//! - **Logging**: tracing subscriber setup

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod source;

// Re-export commonly used types
pub use config::{BindTraceConfig, ConfigError, ConfigLoader};
pub use error::{DecodeError, DecodeResult};
pub use events::{
    ActivityId, AssemblyName, BindEvent, BindStart, BindStop, EventKeywords, EventLevel,
    PayloadValue, TraceEvent,
};
pub use source::{ListenerId, Subscription, TraceListener, TraceProvider, TraceSource};

/// Crate version
pub const BINDTRACE_VERSION: &str = env!("CARGO_PKG_VERSION");
