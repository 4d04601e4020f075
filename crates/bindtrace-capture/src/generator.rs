//! Bind Event Generator
//!
//! Generates a stream of bind start/stop pairs, some nested and some
//! failing, for exercising listeners without a real runtime.

use crate::emitter::BindEmitter;
use crate::{CaptureError, CaptureResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Configuration for bind event generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Interval between binds in milliseconds
    pub interval_ms: u64,

    /// Number of top-level binds to generate (0 = infinite)
    pub bind_count: u64,

    /// Assembly names to cycle through
    pub assembly_names: Vec<String>,

    /// Load context label written on every start
    pub load_context: String,

    /// Every n-th bind resolves a dependency inside it (0 = never)
    pub nest_every: u64,

    /// Every n-th bind fails (0 = never)
    pub fail_every: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            bind_count: 0, // infinite
            assembly_names: vec![
                "System.Text.Json".to_string(),
                "System.Collections.Immutable".to_string(),
                "Newtonsoft.Json".to_string(),
            ],
            load_context: "Default".to_string(),
            nest_every: 3,
            fail_every: 5,
        }
    }
}

/// Generator statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    /// Top-level binds written
    pub binds_generated: u64,
    /// Events written, nested binds included
    pub events_generated: u64,
}

#[derive(Default)]
struct GeneratorCounters {
    binds_generated: AtomicU64,
    events_generated: AtomicU64,
}

/// Bind event generator
pub struct BindEventGenerator {
    config: GeneratorConfig,
    running: Arc<AtomicBool>,
    counters: Arc<GeneratorCounters>,
}

impl BindEventGenerator {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(GeneratorCounters::default()),
        }
    }

    /// Start writing binds through `emitter` on a tokio task
    pub fn start(&mut self, emitter: BindEmitter) -> CaptureResult<JoinHandle<()>> {
        if self.config.assembly_names.is_empty() {
            return Err(CaptureError::InvalidConfig(
                "assembly_names cannot be empty".into(),
            ));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }
        info!("Starting bind event generator");

        let running = self.running.clone();
        let counters = self.counters.clone();
        let config = self.config.clone();

        Ok(tokio::spawn(async move {
            let mut cycle = 0u64;

            while running.load(Ordering::SeqCst) {
                if config.bind_count > 0 && cycle >= config.bind_count {
                    break;
                }

                let written = Self::write_cycle(&emitter, &config, cycle);
                counters.binds_generated.fetch_add(1, Ordering::Relaxed);
                counters.events_generated.fetch_add(written, Ordering::Relaxed);

                cycle += 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(config.interval_ms)).await;
            }

            running.store(false, Ordering::SeqCst);
            info!(
                "Bind generator stopped after {} events",
                counters.events_generated.load(Ordering::Relaxed)
            );
        }))
    }

    /// Write one top-level bind (plus its nested dependency, if any).
    /// Returns the number of events written.
    fn write_cycle(emitter: &BindEmitter, config: &GeneratorConfig, cycle: u64) -> u64 {
        let names = &config.assembly_names;
        let name = &names[(cycle as usize) % names.len()];
        let success = config.fail_every == 0 || (cycle + 1) % config.fail_every != 0;
        let nested = config.nest_every > 0 && (cycle + 1) % config.nest_every == 0;

        let outer = emitter.start(name, &config.load_context, None);
        let mut written = 1;

        if nested {
            let dependency = &names[(cycle as usize + 1) % names.len()];
            emitter.bind(dependency, &config.load_context, Some(outer), true);
            written += 2;
        }

        emitter.stop(outer, success);
        written + 1
    }

    pub fn stop(&self) {
        info!("Stopping bind generator...");
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            binds_generated: self.counters.binds_generated.load(Ordering::Relaxed),
            events_generated: self.counters.events_generated.load(Ordering::Relaxed),
        }
    }
}

impl Default for BindEventGenerator {
    fn default() -> Self {
        Self::new()
    }
}
