//! Event correlator
//!
//! Turns the binder's start/stop events into [`BindRecord`]s. A start whose
//! related activity already has a record is nested inside it; that is
//! decided once, when the start arrives.

use crate::error::{CorrelateResult, ProtocolViolation};
use crate::store::{BindRecord, BindStore};
use bindtrace_core::{ActivityId, BindEvent, BindStart, BindStop, TraceEvent};
use std::sync::Arc;

/// What processing one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Not a binder start/stop event
    Ignored,
    Started { activity: ActivityId, nested: bool },
    Completed { activity: ActivityId, success: bool },
}

/// Per-event state machine over a shared [`BindStore`]
#[derive(Debug, Clone)]
pub struct BindCorrelator {
    store: Arc<BindStore>,
    binder_source: String,
}

impl BindCorrelator {
    pub fn new(store: Arc<BindStore>, binder_source: impl Into<String>) -> Self {
        Self {
            store,
            binder_source: binder_source.into(),
        }
    }

    pub fn store(&self) -> &Arc<BindStore> {
        &self.store
    }

    /// Process one delivered event. Safe to call from several threads at once.
    pub fn process(&self, event: &TraceEvent) -> CorrelateResult<Correlation> {
        // Causal-flow events are only subscribed to for id propagation
        if event.source != self.binder_source {
            return Ok(Correlation::Ignored);
        }

        let decoded = BindEvent::decode(event).map_err(|source| ProtocolViolation::Malformed {
            activity: event.activity_id,
            source,
        })?;

        match decoded {
            Some(BindEvent::Start(start)) => self.on_start(event, start),
            Some(BindEvent::Stop(stop)) => self.on_stop(event, stop),
            None => Ok(Correlation::Ignored),
        }
    }

    fn on_start(&self, event: &TraceEvent, start: BindStart) -> CorrelateResult<Correlation> {
        let activity = event.activity_id;
        // Decided before inserting; the insert rejects a duplicate start atomically
        let nested = event
            .related_activity_id
            .is_some_and(|parent| self.store.contains(&parent));

        self.store.insert(BindRecord::new(
            activity,
            start.assembly_name,
            start.load_context,
            nested,
        ))?;
        Ok(Correlation::Started { activity, nested })
    }

    fn on_stop(&self, event: &TraceEvent, stop: BindStop) -> CorrelateResult<Correlation> {
        let activity = event.activity_id;
        self.store.complete(&activity, stop.success)?;
        Ok(Correlation::Completed {
            activity,
            success: stop.success,
        })
    }
}
