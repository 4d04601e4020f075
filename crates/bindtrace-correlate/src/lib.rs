//! Bind operation correlation
//!
//! Reconstructs assembly bind operations from the binder's start/stop
//! events, classifies binds started inside another bind as nested, and
//! answers bounded "has this assembly been bound yet" queries.
//!
//! Flow: provider → [`SubscriptionGate`] → [`BindCorrelator`] →
//! [`BindStore`] → [`query`] → caller, wrapped by a [`BindSession`].

pub mod correlator;
pub mod error;
pub mod gate;
pub mod query;
pub mod session;
pub mod store;

pub use correlator::{BindCorrelator, Correlation};
pub use error::{CorrelateResult, ProtocolViolation};
pub use gate::SubscriptionGate;
pub use query::{select_top_level, wait_for_binds, wait_for_binds_async};
pub use session::{BindSession, BinderEventListener};
pub use store::{BindRecord, BindStore};
