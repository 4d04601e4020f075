//! Bounded query over a bind store
//!
//! Polls snapshots until a top-level bind for the requested assembly shows
//! up or the timeout passes. A started bind is enough; its stop is not
//! awaited. The store is never locked across polls.

use crate::store::{BindRecord, BindStore};
use std::time::{Duration, Instant};

/// Non-nested records for `assembly` in a fresh snapshot
pub fn select_top_level(store: &BindStore, assembly: &str) -> Vec<BindRecord> {
    store.select(|record| !record.nested && record.assembly_name.matches(assembly))
}

/// Poll `store` until a non-nested bind of `assembly` exists, yielding the
/// thread between polls. Empty on timeout. Always polls at least once.
pub fn wait_for_binds(store: &BindStore, assembly: &str, timeout: Duration) -> Vec<BindRecord> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        let selected = select_top_level(store, assembly);
        if !selected.is_empty() {
            return selected;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Vec::new();
        }
        std::thread::yield_now();
    }
}

/// [`wait_for_binds`] for async callers: yields to the runtime between polls
pub async fn wait_for_binds_async(
    store: &BindStore,
    assembly: &str,
    timeout: Duration,
) -> Vec<BindRecord> {
    let deadline = tokio::time::Instant::now().checked_add(timeout);

    loop {
        let selected = select_top_level(store, assembly);
        if !selected.is_empty() {
            return selected;
        }
        if deadline.is_some_and(|deadline| tokio::time::Instant::now() >= deadline) {
            return Vec::new();
        }
        tokio::task::yield_now().await;
    }
}
