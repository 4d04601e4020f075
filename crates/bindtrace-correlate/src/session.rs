//! Listener session
//!
//! A [`BindSession`] owns one store and one provider attachment. It attaches
//! on construction and detaches on [`BindSession::detach`] or drop, so
//! independent sessions never share state.

use crate::correlator::{BindCorrelator, Correlation};
use crate::gate::SubscriptionGate;
use crate::query;
use crate::store::{BindRecord, BindStore};
use bindtrace_core::{
    BindTraceConfig, ListenerId, Subscription, TraceEvent, TraceListener, TraceProvider,
    TraceSource,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// Listener half of a session: gate on discovery, correlate on delivery
pub struct BinderEventListener {
    gate: SubscriptionGate,
    correlator: BindCorrelator,
}

impl BinderEventListener {
    pub fn new(gate: SubscriptionGate, store: Arc<BindStore>) -> Self {
        let correlator = BindCorrelator::new(store, gate.binder_source());
        Self { gate, correlator }
    }
}

impl TraceListener for BinderEventListener {
    fn name(&self) -> &str {
        "binder-event-listener"
    }

    fn on_source_created(&self, source: &TraceSource) -> Option<Subscription> {
        self.gate.decide(source)
    }

    /// Protocol violations panic on the delivering thread.
    fn on_event_written(&self, event: &TraceEvent) {
        match self.correlator.process(event) {
            Ok(Correlation::Started { activity, nested }) => {
                debug!(%activity, nested, "bind started");
            }
            Ok(Correlation::Completed { activity, success }) => {
                debug!(%activity, success, "bind completed");
            }
            Ok(Correlation::Ignored) => {
                trace!("Ignoring {}/{}", event.source, event.name);
            }
            Err(violation) => {
                error!(activity = %violation.activity(), "bind protocol violation: {}", violation);
                panic!("bind protocol violation: {}", violation);
            }
        }
    }
}

/// An attached binder listener and the records it has correlated
pub struct BindSession {
    provider: Arc<dyn TraceProvider>,
    listener_id: Option<ListenerId>,
    store: Arc<BindStore>,
    default_timeout: Duration,
}

impl BindSession {
    /// Attach a new session to `provider`
    pub fn attach(provider: Arc<dyn TraceProvider>, config: &BindTraceConfig) -> Self {
        let store = Arc::new(BindStore::new());
        let gate = SubscriptionGate::new(&config.sources);
        let listener = Arc::new(BinderEventListener::new(gate, store.clone()));

        let listener_id = provider.attach(listener);
        info!("Bind session attached as {}", listener_id);

        Self {
            provider,
            listener_id: Some(listener_id),
            store,
            default_timeout: Duration::from_millis(config.query.default_timeout_ms),
        }
    }

    /// Attach with default configuration
    pub fn attach_default(provider: Arc<dyn TraceProvider>) -> Self {
        Self::attach(provider, &BindTraceConfig::default())
    }

    /// Top-level binds of `assembly`, waiting up to `timeout` for one to appear
    pub fn wait_for_binds(&self, assembly: &str, timeout: Duration) -> Vec<BindRecord> {
        query::wait_for_binds(&self.store, assembly, timeout)
    }

    pub fn wait_for_binds_ms(&self, assembly: &str, timeout_ms: u64) -> Vec<BindRecord> {
        self.wait_for_binds(assembly, Duration::from_millis(timeout_ms))
    }

    /// [`Self::wait_for_binds`] with the configured default timeout
    pub fn wait_for_binds_default(&self, assembly: &str) -> Vec<BindRecord> {
        self.wait_for_binds(assembly, self.default_timeout)
    }

    pub async fn wait_for_binds_async(&self, assembly: &str, timeout: Duration) -> Vec<BindRecord> {
        query::wait_for_binds_async(&self.store, assembly, timeout).await
    }

    /// Every record, nested or not, oldest first
    pub fn records(&self) -> Vec<BindRecord> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Arc<BindStore> {
        &self.store
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        self.store.to_json()
    }

    /// Provider handle, while attached
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.listener_id
    }

    /// Detach from the provider and drop the session's records
    pub fn detach(mut self) -> bool {
        self.detach_inner()
    }

    fn detach_inner(&mut self) -> bool {
        match self.listener_id.take() {
            Some(id) => {
                let detached = self.provider.detach(id);
                info!(
                    "Bind session {} detached with {} records",
                    id,
                    self.store.len()
                );
                detached
            }
            None => false,
        }
    }
}

impl Drop for BindSession {
    fn drop(&mut self) {
        self.detach_inner();
    }
}
