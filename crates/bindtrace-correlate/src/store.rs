//! Bind record store
//!
//! Sharded by activity id through DashMap, so records for different
//! activities never contend on one lock. Records are inserted fully built
//! and never removed for the lifetime of the store.

use crate::error::{CorrelateResult, ProtocolViolation};
use bindtrace_core::{ActivityId, AssemblyName};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

/// One bind operation, keyed by the activity id of its start event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindRecord {
    pub activity_id: ActivityId,

    /// Assembly the bind was for
    pub assembly_name: AssemblyName,

    /// Load context that initiated the bind
    pub load_context: String,

    /// Outcome; `None` until the stop event arrives
    pub success: Option<bool>,

    /// Started while its related activity already had a record.
    /// Fixed at creation.
    pub nested: bool,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BindRecord {
    pub fn new(
        activity_id: ActivityId,
        assembly_name: AssemblyName,
        load_context: impl Into<String>,
        nested: bool,
    ) -> Self {
        Self {
            activity_id,
            assembly_name,
            load_context: load_context.into(),
            success: None,
            nested,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.success.is_some()
    }
}

/// Concurrent store of bind records
#[derive(Debug, Default)]
pub struct BindStore {
    records: DashMap<ActivityId, BindRecord>,
}

impl BindStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
        }
    }

    pub fn contains(&self, activity: &ActivityId) -> bool {
        self.records.contains_key(activity)
    }

    /// Copy of one record
    pub fn get(&self, activity: &ActivityId) -> Option<BindRecord> {
        self.records.get(activity).map(|r| r.value().clone())
    }

    /// Insert a new record; fails if its activity already has one
    pub(crate) fn insert(&self, record: BindRecord) -> CorrelateResult<()> {
        match self.records.entry(record.activity_id) {
            Entry::Occupied(existing) => Err(ProtocolViolation::DuplicateStart(*existing.key())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Set the outcome of a started bind, exactly once
    pub(crate) fn complete(&self, activity: &ActivityId, success: bool) -> CorrelateResult<()> {
        let mut record = self
            .records
            .get_mut(activity)
            .ok_or(ProtocolViolation::StopWithoutStart(*activity))?;

        if record.success.is_some() {
            return Err(ProtocolViolation::DuplicateStop(*activity));
        }
        record.success = Some(success);
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Point-in-time copy of every record, oldest first.
    ///
    /// Shards are read one after another, so a record inserted during the
    /// copy may or may not be included.
    pub fn snapshot(&self) -> Vec<BindRecord> {
        let mut records: Vec<BindRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.activity_id.cmp(&b.activity_id))
        });
        records
    }

    /// Records matching a predicate, from a fresh snapshot
    pub fn select(&self, predicate: impl Fn(&BindRecord) -> bool) -> Vec<BindRecord> {
        self.snapshot().into_iter().filter(|r| predicate(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, nested: bool) -> BindRecord {
        BindRecord::new(ActivityId::new(), AssemblyName::simple(name), "Default", nested)
    }

    #[test]
    fn test_insert_and_get() {
        let store = BindStore::new();
        let rec = record("Foo", false);
        let id = rec.activity_id;

        store.insert(rec.clone()).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.get(&id), Some(rec));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_keeps_original() {
        let store = BindStore::new();
        let first = record("Foo", false);
        let id = first.activity_id;
        store.insert(first).unwrap();

        let mut second = record("Bar", true);
        second.activity_id = id;
        let err = store.insert(second).unwrap_err();

        assert!(matches!(err, ProtocolViolation::DuplicateStart(dup) if dup == id));
        assert_eq!(store.get(&id).unwrap().assembly_name.name, "Foo");
    }

    #[test]
    fn test_complete_once() {
        let store = BindStore::new();
        let rec = record("Foo", false);
        let id = rec.activity_id;
        store.insert(rec).unwrap();
        assert!(!store.get(&id).unwrap().is_complete());

        store.complete(&id, false).unwrap();
        let completed = store.get(&id).unwrap();
        assert_eq!(completed.success, Some(false));
        assert!(completed.completed_at.is_some());

        assert!(matches!(
            store.complete(&id, true),
            Err(ProtocolViolation::DuplicateStop(_))
        ));
        assert_eq!(store.get(&id).unwrap().success, Some(false));
    }

    #[test]
    fn test_complete_unknown() {
        let store = BindStore::new();
        assert!(matches!(
            store.complete(&ActivityId::new(), true),
            Err(ProtocolViolation::StopWithoutStart(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let store = BindStore::new();
        let rec = record("Foo", false);
        let id = rec.activity_id;
        store.insert(rec).unwrap();

        let snapshot = store.snapshot();
        store.complete(&id, true).unwrap();

        assert_eq!(snapshot[0].success, None);
        assert_eq!(store.get(&id).unwrap().success, Some(true));
    }

    #[test]
    fn test_select_and_json() {
        let store = BindStore::new();
        store.insert(record("Foo", false)).unwrap();
        store.insert(record("Foo", true)).unwrap();
        store.insert(record("Bar", false)).unwrap();

        assert_eq!(store.select(|r| r.assembly_name.matches("Foo")).len(), 2);
        assert_eq!(store.select(|r| !r.nested).len(), 2);

        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert!(json[0].get("completed_at").is_none());
    }
}
