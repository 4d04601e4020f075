//! Trace event envelope - the structured record a trace provider emits

use super::payload::PayloadValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};
use uuid::Uuid;

/// Opaque activity identifier minted by the provider per logical operation
///
/// Only ever compared and hashed; its contents carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Uuid);

impl ActivityId {
    /// The empty activity id, used by providers for "no activity"
    pub const EMPTY: ActivityId = ActivityId(Uuid::nil());

    /// Mint a fresh, globally unique activity id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Event verbosity, ordered from least to most verbose
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Delivered regardless of the subscribed level
    LogAlways = 0,
    Critical = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Informational = 4,
    Verbose = 5,
}

/// Keyword bitmask attached to events and subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKeywords(u64);

impl EventKeywords {
    pub const NONE: EventKeywords = EventKeywords(0);
    pub const ALL: EventKeywords = EventKeywords(u64::MAX);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when the two masks share at least one bit
    pub const fn intersects(&self, other: EventKeywords) -> bool {
        self.0 & other.0 != 0
    }

    /// True when every bit of `other` is set in `self`
    pub const fn contains(&self, other: EventKeywords) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventKeywords {
    type Output = EventKeywords;

    fn bitor(self, rhs: Self) -> Self::Output {
        EventKeywords(self.0 | rhs.0)
    }
}

impl BitAnd for EventKeywords {
    type Output = EventKeywords;

    fn bitand(self, rhs: Self) -> Self::Output {
        EventKeywords(self.0 & rhs.0)
    }
}

impl fmt::Display for EventKeywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A single event as written by a trace source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Name of the source that wrote the event
    pub source: String,

    /// Event name (e.g., "AssemblyBindStart")
    pub name: String,

    /// Verbosity of the event
    pub level: EventLevel,

    /// Keywords the event was written under
    pub keywords: EventKeywords,

    /// Activity the event belongs to
    pub activity_id: ActivityId,

    /// Activity that caused this one, if the provider propagated it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_activity_id: Option<ActivityId>,

    /// Named payload values, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<(String, PayloadValue)>,

    /// When the event was written
    pub ts: DateTime<Utc>,
}

impl TraceEvent {
    /// Create an event with an empty payload and a fresh activity id
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            level: EventLevel::default(),
            keywords: EventKeywords::NONE,
            activity_id: ActivityId::new(),
            related_activity_id: None,
            payload: Vec::new(),
            ts: Utc::now(),
        }
    }

    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_keywords(mut self, keywords: EventKeywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_activity(mut self, activity_id: ActivityId) -> Self {
        self.activity_id = activity_id;
        self
    }

    /// Set the causing activity. The empty id is treated as "none".
    pub fn with_related(mut self, related: ActivityId) -> Self {
        self.related_activity_id = (!related.is_empty()).then_some(related);
        self
    }

    /// Append a payload field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.push((name.into(), value.into()));
        self
    }

    /// Look up a payload value by field name
    pub fn field(&self, name: &str) -> Option<&PayloadValue> {
        self.payload
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Payload field names, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.payload.iter().map(|(name, _)| name.as_str())
    }
}
