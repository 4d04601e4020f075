//! Writes binder events the way the runtime does
//!
//! A bind is a start/stop pair sharing one activity id. A bind started
//! while another is in flight carries the outer bind's id as its related
//! activity id.

use crate::hub::TraceHub;
use bindtrace_core::config::{BINDER_KEYWORD, DEFAULT_BINDER_SOURCE};
use bindtrace_core::events::{
    ASSEMBLY_NAME_FIELD, BIND_START_EVENT, BIND_STOP_EVENT, LOAD_CONTEXT_FIELD, SUCCESS_FIELD,
};
use bindtrace_core::{ActivityId, EventKeywords, EventLevel, TraceEvent};
use std::sync::Arc;

/// Writes bind start/stop events to a hub
#[derive(Clone)]
pub struct BindEmitter {
    hub: Arc<TraceHub>,
    source: String,
    keywords: EventKeywords,
}

impl BindEmitter {
    /// Emitter for the default runtime source and binder keyword
    pub fn new(hub: Arc<TraceHub>) -> Self {
        Self {
            hub,
            source: DEFAULT_BINDER_SOURCE.to_string(),
            keywords: BINDER_KEYWORD,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_keywords(mut self, keywords: EventKeywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn hub(&self) -> &Arc<TraceHub> {
        &self.hub
    }

    /// Build a bind start without writing it
    pub fn start_event(
        &self,
        assembly_name: &str,
        load_context: &str,
        parent: Option<ActivityId>,
    ) -> TraceEvent {
        let event = TraceEvent::new(&self.source, BIND_START_EVENT)
            .with_level(EventLevel::Informational)
            .with_keywords(self.keywords)
            .with_field(ASSEMBLY_NAME_FIELD, assembly_name)
            .with_field(LOAD_CONTEXT_FIELD, load_context);
        match parent {
            Some(parent) => event.with_related(parent),
            None => event,
        }
    }

    /// Build a bind stop without writing it
    pub fn stop_event(&self, activity: ActivityId, success: bool) -> TraceEvent {
        TraceEvent::new(&self.source, BIND_STOP_EVENT)
            .with_level(EventLevel::Informational)
            .with_keywords(self.keywords)
            .with_activity(activity)
            .with_field(SUCCESS_FIELD, success)
    }

    /// Write a bind start; returns the new bind's activity id
    pub fn start(
        &self,
        assembly_name: &str,
        load_context: &str,
        parent: Option<ActivityId>,
    ) -> ActivityId {
        let event = self.start_event(assembly_name, load_context, parent);
        let activity = event.activity_id;
        self.hub.write(event);
        activity
    }

    /// Write the stop for a started bind
    pub fn stop(&self, activity: ActivityId, success: bool) {
        self.hub.write(self.stop_event(activity, success));
    }

    /// Write a complete start/stop pair
    pub fn bind(
        &self,
        assembly_name: &str,
        load_context: &str,
        parent: Option<ActivityId>,
        success: bool,
    ) -> ActivityId {
        let activity = self.start(assembly_name, load_context, parent);
        self.stop(activity, success);
        activity
    }

    /// Write an arbitrary event, e.g. a malformed one
    pub fn write_raw(&self, event: TraceEvent) {
        self.hub.write(event);
    }
}
