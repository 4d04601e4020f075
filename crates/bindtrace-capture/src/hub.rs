//! In-process trace provider
//!
//! [`TraceHub`] keeps the set of known sources and attached listeners,
//! asks every listener about every source exactly once, and fans written
//! events out to the listeners whose subscription covers them.

use bindtrace_core::config::{SourceSettings, DEFAULT_CAUSAL_FLOW_SOURCE, TASKS_FLOW_ACTIVITY_IDS};
use bindtrace_core::{
    EventKeywords, ListenerId, Subscription, TraceEvent, TraceListener, TraceProvider, TraceSource,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Source whose subscription turns on related activity id propagation
    pub causal_flow_source: String,

    /// Keyword a listener must enable on the causal-flow source
    pub causal_flow_keywords: EventKeywords,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            causal_flow_source: DEFAULT_CAUSAL_FLOW_SOURCE.to_string(),
            causal_flow_keywords: TASKS_FLOW_ACTIVITY_IDS,
        }
    }
}

impl From<&SourceSettings> for HubConfig {
    fn from(settings: &SourceSettings) -> Self {
        Self {
            causal_flow_source: settings.causal_flow_source.clone(),
            causal_flow_keywords: settings.causal_flow_keywords(),
        }
    }
}

/// Hub statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Known sources
    pub sources: usize,
    /// Attached listeners
    pub listeners: usize,
    /// Events written to the hub
    pub events_written: u64,
    /// Event deliveries (one event delivered to two listeners counts twice)
    pub events_delivered: u64,
    /// Events no listener subscribed to
    pub events_filtered: u64,
}

#[derive(Default)]
struct HubCounters {
    events_written: AtomicU64,
    events_delivered: AtomicU64,
    events_filtered: AtomicU64,
}

struct Registration {
    id: ListenerId,
    listener: Arc<dyn TraceListener>,
    /// Subscriptions by source name; disabled sources are absent
    subscriptions: HashMap<String, Subscription>,
}

impl Registration {
    fn propagates_related(&self, config: &HubConfig) -> bool {
        self.subscriptions
            .get(&config.causal_flow_source)
            .is_some_and(|sub| sub.enables(config.causal_flow_keywords))
    }
}

/// In-process trace provider
///
/// Discovery callbacks are serialized by an internal lock and must not
/// re-enter the hub's discovery (`register_source`, `attach`). Event
/// callbacks run on the writing thread with no hub lock held.
pub struct TraceHub {
    config: HubConfig,
    sources: RwLock<Vec<TraceSource>>,
    listeners: RwLock<Vec<Registration>>,
    discovery: Mutex<()>,
    next_id: AtomicU64,
    counters: HubCounters,
}

impl TraceHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            sources: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            discovery: Mutex::new(()),
            next_id: AtomicU64::new(1),
            counters: HubCounters::default(),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a source, announcing it to every attached listener.
    /// Registering a known source again is a no-op.
    pub fn register_source(&self, name: &str) -> TraceSource {
        if let Some(existing) = self.find_source(name) {
            return existing;
        }

        let _discovery = self.discovery.lock();
        if let Some(existing) = self.find_source(name) {
            return existing;
        }

        let source = TraceSource::new(name);
        self.sources.write().push(source.clone());
        debug!("Registered trace source: {}", name);

        let listeners: Vec<(ListenerId, Arc<dyn TraceListener>)> = self
            .listeners
            .read()
            .iter()
            .map(|reg| (reg.id, reg.listener.clone()))
            .collect();

        for (id, listener) in listeners {
            if let Some(sub) = listener.on_source_created(&source) {
                self.store_subscription(id, &source, sub);
            }
        }

        source
    }

    fn find_source(&self, name: &str) -> Option<TraceSource> {
        self.sources.read().iter().find(|s| s.name == name).cloned()
    }

    fn store_subscription(&self, id: ListenerId, source: &TraceSource, sub: Subscription) {
        let mut listeners = self.listeners.write();
        if let Some(reg) = listeners.iter_mut().find(|reg| reg.id == id) {
            debug!(
                "{} enabled {} at {:?} keywords {}",
                reg.listener.name(),
                source.name,
                sub.level,
                sub.keywords
            );
            reg.subscriptions.insert(source.name.clone(), sub);
        }
    }

    /// Write an event. Unknown sources are registered first.
    pub fn write(&self, event: TraceEvent) {
        self.register_source(&event.source);
        self.counters.events_written.fetch_add(1, Ordering::Relaxed);

        let targets: Vec<(Arc<dyn TraceListener>, bool)> = self
            .listeners
            .read()
            .iter()
            .filter(|reg| {
                reg.subscriptions
                    .get(&event.source)
                    .is_some_and(|sub| sub.permits(&event))
            })
            .map(|reg| (reg.listener.clone(), reg.propagates_related(&self.config)))
            .collect();

        if targets.is_empty() {
            self.counters.events_filtered.fetch_add(1, Ordering::Relaxed);
            trace!("No subscriber for {}/{}", event.source, event.name);
            return;
        }

        let mut stripped: Option<TraceEvent> = None;
        for (listener, propagates_related) in targets {
            if propagates_related || event.related_activity_id.is_none() {
                listener.on_event_written(&event);
            } else {
                let without_related = stripped.get_or_insert_with(|| {
                    let mut copy = event.clone();
                    copy.related_activity_id = None;
                    copy
                });
                listener.on_event_written(without_related);
            }
            self.counters.events_delivered.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Known sources, in registration order
    pub fn sources(&self) -> Vec<TraceSource> {
        self.sources.read().clone()
    }

    /// Subscription a listener holds on a source, if it enabled it
    pub fn subscription(&self, id: ListenerId, source: &str) -> Option<Subscription> {
        self.listeners
            .read()
            .iter()
            .find(|reg| reg.id == id)
            .and_then(|reg| reg.subscriptions.get(source).copied())
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            sources: self.sources.read().len(),
            listeners: self.listeners.read().len(),
            events_written: self.counters.events_written.load(Ordering::Relaxed),
            events_delivered: self.counters.events_delivered.load(Ordering::Relaxed),
            events_filtered: self.counters.events_filtered.load(Ordering::Relaxed),
        }
    }
}

impl Default for TraceHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl TraceProvider for TraceHub {
    fn attach(&self, listener: Arc<dyn TraceListener>) -> ListenerId {
        let _discovery = self.discovery.lock();

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let sources = self.sources.read().clone();

        let mut subscriptions = HashMap::new();
        for source in &sources {
            if let Some(sub) = listener.on_source_created(source) {
                subscriptions.insert(source.name.clone(), sub);
            }
        }

        info!(
            "Attached {} as {} ({} of {} sources enabled)",
            listener.name(),
            id,
            subscriptions.len(),
            sources.len()
        );

        self.listeners.write().push(Registration {
            id,
            listener,
            subscriptions,
        });
        id
    }

    fn detach(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|reg| reg.id != id);
        let removed = listeners.len() != before;
        if removed {
            info!("Detached {}", id);
        }
        removed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bindtrace_core::{ActivityId, EventLevel};

    /// Listener that subscribes to everything it is told to and records events
    pub(crate) struct RecordingListener {
        enable: Vec<(String, Subscription)>,
        pub(crate) discovered: Mutex<Vec<String>>,
        pub(crate) events: Mutex<Vec<TraceEvent>>,
    }

    impl RecordingListener {
        pub(crate) fn new(enable: Vec<(&str, Subscription)>) -> Arc<Self> {
            Arc::new(Self {
                enable: enable.into_iter().map(|(s, sub)| (s.to_string(), sub)).collect(),
                discovered: Mutex::new(Vec::new()),
                events: Mutex::new(Vec::new()),
            })
        }
    }

    impl TraceListener for RecordingListener {
        fn name(&self) -> &str {
            "recording"
        }

        fn on_source_created(&self, source: &TraceSource) -> Option<Subscription> {
            self.discovered.lock().push(source.name.clone());
            self.enable
                .iter()
                .find(|(name, _)| *name == source.name)
                .map(|(_, sub)| *sub)
        }

        fn on_event_written(&self, event: &TraceEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn flow_subscription() -> Subscription {
        Subscription::new(EventLevel::Verbose, TASKS_FLOW_ACTIVITY_IDS)
    }

    #[test]
    fn test_discovery_once_per_source() {
        let hub = TraceHub::default();
        hub.register_source("A");

        let listener = RecordingListener::new(vec![]);
        hub.attach(listener.clone());

        hub.register_source("B");
        hub.register_source("A");
        hub.write(TraceEvent::new("B", "evt"));

        assert_eq!(*listener.discovered.lock(), vec!["A", "B"]);
        assert_eq!(hub.stats().sources, 2);
    }

    #[test]
    fn test_only_subscribed_sources_delivered() {
        let hub = TraceHub::default();
        let listener = RecordingListener::new(vec![("A", Subscription::all())]);
        let id = hub.attach(listener.clone());

        hub.write(TraceEvent::new("A", "one"));
        hub.write(TraceEvent::new("B", "two"));

        let events = listener.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "one");
        assert!(hub.subscription(id, "A").is_some());
        assert!(hub.subscription(id, "B").is_none());

        let stats = hub.stats();
        assert_eq!(stats.events_written, 2);
        assert_eq!(stats.events_delivered, 1);
        assert_eq!(stats.events_filtered, 1);
    }

    #[test]
    fn test_keyword_filter_applied() {
        let hub = TraceHub::default();
        let sub = Subscription::new(EventLevel::Verbose, EventKeywords::from_bits(0x4));
        let listener = RecordingListener::new(vec![("A", sub)]);
        hub.attach(listener.clone());

        hub.write(TraceEvent::new("A", "binder").with_keywords(EventKeywords::from_bits(0x4)));
        hub.write(TraceEvent::new("A", "gc").with_keywords(EventKeywords::from_bits(0x1)));

        let names: Vec<String> = listener.events.lock().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["binder"]);
    }

    #[test]
    fn test_related_id_requires_flow_subscription() {
        let hub = TraceHub::default();
        let plain = RecordingListener::new(vec![("A", Subscription::all())]);
        let flowing = RecordingListener::new(vec![
            ("A", Subscription::all()),
            (DEFAULT_CAUSAL_FLOW_SOURCE, flow_subscription()),
        ]);
        hub.attach(plain.clone());
        hub.attach(flowing.clone());
        hub.register_source(DEFAULT_CAUSAL_FLOW_SOURCE);

        let parent = ActivityId::new();
        hub.write(TraceEvent::new("A", "child").with_related(parent));

        assert_eq!(plain.events.lock()[0].related_activity_id, None);
        assert_eq!(flowing.events.lock()[0].related_activity_id, Some(parent));
    }

    #[test]
    fn test_detach_stops_delivery() {
        let hub = TraceHub::default();
        let listener = RecordingListener::new(vec![("A", Subscription::all())]);
        let id = hub.attach(listener.clone());

        hub.write(TraceEvent::new("A", "before"));
        assert!(hub.detach(id));
        assert!(!hub.detach(id));
        hub.write(TraceEvent::new("A", "after"));

        assert_eq!(listener.events.lock().len(), 1);
        assert_eq!(hub.stats().listeners, 0);
    }
}
