//! Trace event types
//!
//! Providers emit untyped [`TraceEvent`]s; the binder's start/stop pair is
//! decoded into [`BindEvent`] at the boundary.

pub mod assembly;
pub mod bind;
pub mod envelope;
pub mod payload;

pub use assembly::*;
pub use bind::*;
pub use envelope::*;
pub use payload::*;
