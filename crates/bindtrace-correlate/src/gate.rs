//! Subscription gate: which discovered sources a session enables

use bindtrace_core::config::SourceSettings;
use bindtrace_core::{EventKeywords, EventLevel, Subscription, TraceSource};

#[derive(Debug, Clone)]
pub struct SubscriptionGate {
    binder_source: String,
    binder_keywords: EventKeywords,
    causal_flow_source: String,
    causal_flow_keywords: EventKeywords,
}

impl SubscriptionGate {
    pub fn new(settings: &SourceSettings) -> Self {
        Self {
            binder_source: settings.binder_source.clone(),
            binder_keywords: settings.binder_keywords(),
            causal_flow_source: settings.causal_flow_source.clone(),
            causal_flow_keywords: settings.causal_flow_keywords(),
        }
    }

    /// Decide the subscription for a newly discovered source.
    ///
    /// The binder source is enabled for binder events; the causal-flow source
    /// only so that related activity ids get propagated. Everything else
    /// stays disabled.
    pub fn decide(&self, source: &TraceSource) -> Option<Subscription> {
        if source.name == self.binder_source {
            Some(Subscription::new(EventLevel::Verbose, self.binder_keywords))
        } else if source.name == self.causal_flow_source {
            Some(Subscription::new(EventLevel::Verbose, self.causal_flow_keywords))
        } else {
            None
        }
    }

    pub fn binder_source(&self) -> &str {
        &self.binder_source
    }
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::new(&SourceSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindtrace_core::config::{
        BINDER_KEYWORD, DEFAULT_BINDER_SOURCE, DEFAULT_CAUSAL_FLOW_SOURCE, TASKS_FLOW_ACTIVITY_IDS,
    };

    #[test]
    fn test_binder_source_enabled_verbose() {
        let gate = SubscriptionGate::default();
        let sub = gate.decide(&TraceSource::new(DEFAULT_BINDER_SOURCE)).unwrap();
        assert_eq!(sub.level, EventLevel::Verbose);
        assert_eq!(sub.keywords, BINDER_KEYWORD);
    }

    #[test]
    fn test_causal_flow_source_enabled_for_flow_ids() {
        let gate = SubscriptionGate::default();
        let sub = gate.decide(&TraceSource::new(DEFAULT_CAUSAL_FLOW_SOURCE)).unwrap();
        assert_eq!(sub.level, EventLevel::Verbose);
        assert_eq!(sub.keywords, TASKS_FLOW_ACTIVITY_IDS);
    }

    #[test]
    fn test_other_sources_disabled() {
        let gate = SubscriptionGate::default();
        assert!(gate.decide(&TraceSource::new("System.Net.Http")).is_none());
        assert!(gate
            .decide(&TraceSource::new("microsoft-windows-dotnetruntime"))
            .is_none());
    }

    #[test]
    fn test_configured_names() {
        let settings = SourceSettings {
            binder_source: "Test-Runtime".to_string(),
            binder_keywords: 0x8,
            ..Default::default()
        };
        let gate = SubscriptionGate::new(&settings);

        assert_eq!(gate.binder_source(), "Test-Runtime");
        let sub = gate.decide(&TraceSource::new("Test-Runtime")).unwrap();
        assert_eq!(sub.keywords.bits(), 0x8);
        assert!(gate.decide(&TraceSource::new(DEFAULT_BINDER_SOURCE)).is_none());
    }
}
