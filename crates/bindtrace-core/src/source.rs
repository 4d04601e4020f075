//! Listener and provider traits
//!
//! A [`TraceProvider`] owns named trace sources and delivers their events to
//! attached [`TraceListener`]s. Each listener decides, once per discovered
//! source, whether to subscribe and with which level and keywords.

use crate::events::{EventKeywords, EventLevel, TraceEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named trace source known to a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceSource {
    /// Source name (e.g., "Microsoft-Windows-DotNETRuntime")
    pub name: String,
}

impl TraceSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// What a listener asked to receive from one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Most verbose level to deliver
    pub level: EventLevel,

    /// Keywords to deliver; empty means every keyword
    pub keywords: EventKeywords,
}

impl Subscription {
    pub fn new(level: EventLevel, keywords: EventKeywords) -> Self {
        Self { level, keywords }
    }

    /// Subscribe to everything a source writes
    pub fn all() -> Self {
        Self::new(EventLevel::Verbose, EventKeywords::NONE)
    }

    /// Whether an event falls inside this subscription
    pub fn permits(&self, event: &TraceEvent) -> bool {
        let level_ok = event.level == EventLevel::LogAlways || event.level <= self.level;
        let keywords_ok = self.keywords.is_empty()
            || event.keywords.is_empty()
            || event.keywords.intersects(self.keywords);
        level_ok && keywords_ok
    }

    /// Whether this subscription enables every bit of `keywords`
    pub fn enables(&self, keywords: EventKeywords) -> bool {
        self.keywords.is_empty() || self.keywords.contains(keywords)
    }
}

/// Handle identifying one attached listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Receives source discovery and event callbacks from a provider
///
/// Callbacks may arrive concurrently from any thread.
pub trait TraceListener: Send + Sync {
    /// Listener name, for logs
    fn name(&self) -> &str;

    /// Called once per source; return a subscription to enable it
    fn on_source_created(&self, source: &TraceSource) -> Option<Subscription>;

    /// Called for every event inside one of the listener's subscriptions
    fn on_event_written(&self, event: &TraceEvent);
}

/// Delivers trace events to attached listeners
pub trait TraceProvider: Send + Sync {
    /// Attach a listener. Discovery is replayed for every known source.
    fn attach(&self, listener: Arc<dyn TraceListener>) -> ListenerId;

    /// Detach a listener; returns false if it was not attached
    fn detach(&self, id: ListenerId) -> bool;
}
