//! Configuration for bindtrace
//!
//! Provides:
//! - Config file discovery (explicit path, env var, standard paths)
//! - TOML parsing with serde
//! - Environment variable overrides
//! - Validation

use crate::events::EventKeywords;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default name of the runtime source that writes binder events
pub const DEFAULT_BINDER_SOURCE: &str = "Microsoft-Windows-DotNETRuntime";

/// Default name of the source whose flow keyword propagates related activity ids
pub const DEFAULT_CAUSAL_FLOW_SOURCE: &str = "System.Threading.Tasks.TplEventSource";

/// Binder keyword on the runtime source
pub const BINDER_KEYWORD: EventKeywords = EventKeywords::from_bits(0x4);

/// "Flow activity ids" keyword on the causal-flow source
pub const TASKS_FLOW_ACTIVITY_IDS: EventKeywords = EventKeywords::from_bits(0x80);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete bindtrace configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindTraceConfig {
    /// Logging settings
    pub logging: LoggingSettings,

    /// Which trace sources to enable and how
    pub sources: SourceSettings,

    /// Bounded query settings
    pub query: QuerySettings,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Source subscription settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Source that writes bind start/stop events
    pub binder_source: String,

    /// Keyword mask enabled on the binder source
    pub binder_keywords: u64,

    /// Source whose keyword turns on related activity id propagation
    pub causal_flow_source: String,

    /// Keyword mask enabled on the causal-flow source
    pub causal_flow_keywords: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            binder_source: DEFAULT_BINDER_SOURCE.to_string(),
            binder_keywords: BINDER_KEYWORD.bits(),
            causal_flow_source: DEFAULT_CAUSAL_FLOW_SOURCE.to_string(),
            causal_flow_keywords: TASKS_FLOW_ACTIVITY_IDS.bits(),
        }
    }
}

impl SourceSettings {
    pub fn binder_keywords(&self) -> EventKeywords {
        EventKeywords::from_bits(self.binder_keywords)
    }

    pub fn causal_flow_keywords(&self) -> EventKeywords {
        EventKeywords::from_bits(self.causal_flow_keywords)
    }
}

/// Bounded query settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Timeout used when the caller does not pass one (ms)
    pub default_timeout_ms: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: 5000,
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    /// Explicit config path, if any
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            explicit_path: None,
        }
    }

    /// Use an explicit config path
    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Load configuration with the following precedence:
    /// 1. Explicit path
    /// 2. BINDTRACE_CONFIG environment variable
    /// 3. ~/.config/bindtrace/config.toml
    /// 4. Default values
    pub fn load(&self) -> ConfigResult<BindTraceConfig> {
        let mut config = if let Some(path) = self.find_config_file() {
            info!("Loading configuration from: {}", path.display());
            self.load_from_file(&path)?
        } else {
            debug!("No config file found, using defaults");
            BindTraceConfig::default()
        };

        self.apply_env_overrides(&mut config);
        self.validate(&config)?;

        Ok(config)
    }

    /// Find the config file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("Config path does not exist: {}", path.display());
        }

        if let Ok(env_path) = std::env::var("BINDTRACE_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
            warn!("BINDTRACE_CONFIG path does not exist: {}", env_path);
        }

        Self::default_config_path().filter(|path| path.exists())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(&self, path: &Path) -> ConfigResult<BindTraceConfig> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: BindTraceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut BindTraceConfig) {
        Self::apply_overrides(config, |key| std::env::var(key).ok());
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    fn apply_overrides(config: &mut BindTraceConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("BINDTRACE_LOG_LEVEL") {
            config.logging.log_level = val;
        }

        if let Some(val) = lookup("BINDTRACE_BINDER_SOURCE") {
            config.sources.binder_source = val;
        }
        if let Some(val) = lookup("BINDTRACE_CAUSAL_FLOW_SOURCE") {
            config.sources.causal_flow_source = val;
        }

        if let Some(val) = lookup("BINDTRACE_QUERY_TIMEOUT_MS") {
            match val.parse() {
                Ok(ms) => config.query.default_timeout_ms = ms,
                Err(_) => warn!("Ignoring invalid BINDTRACE_QUERY_TIMEOUT_MS: {}", val),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self, config: &BindTraceConfig) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                config.logging.log_level, valid_levels
            )));
        }

        let sources = &config.sources;
        if sources.binder_source.trim().is_empty() || sources.causal_flow_source.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Source names cannot be empty".to_string(),
            ));
        }
        if sources.binder_source == sources.causal_flow_source {
            return Err(ConfigError::ValidationError(format!(
                "Binder and causal-flow sources must differ (both are {})",
                sources.binder_source
            )));
        }
        if sources.binder_keywords == 0 || sources.causal_flow_keywords == 0 {
            return Err(ConfigError::ValidationError(
                "Keyword masks cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, config: &BindTraceConfig, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::ValidationError(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Get the default config file path for the current platform
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("bindtrace").join("config.toml"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper module for platform-specific directories
mod dirs {
    use std::path::PathBuf;

    /// Get the user's config directory
    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }

        #[cfg(not(target_os = "windows"))]
        {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = BindTraceConfig::default();
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.sources.binder_source, DEFAULT_BINDER_SOURCE);
        assert_eq!(config.sources.binder_keywords(), BINDER_KEYWORD);
        assert_eq!(config.sources.causal_flow_keywords(), TASKS_FLOW_ACTIVITY_IDS);
        assert_eq!(config.query.default_timeout_ms, 5000);
        assert!(ConfigLoader::new().validate(&config).is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
            [logging]
            log_level = "debug"
        "#;
        let config: BindTraceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.sources, SourceSettings::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [logging]
            log_level = "trace"

            [sources]
            binder_source = "Test-Runtime"
            binder_keywords = 12
            causal_flow_source = "Test-Flow"
            causal_flow_keywords = 128

            [query]
            default_timeout_ms = 250
        "#;

        let config: BindTraceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sources.binder_source, "Test-Runtime");
        assert_eq!(config.sources.binder_keywords().bits(), 12);
        assert_eq!(config.sources.causal_flow_source, "Test-Flow");
        assert_eq!(config.query.default_timeout_ms, 250);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BINDTRACE_LOG_LEVEL", "warn"),
            ("BINDTRACE_BINDER_SOURCE", "Other-Runtime"),
            ("BINDTRACE_QUERY_TIMEOUT_MS", "1200"),
        ]
        .into_iter()
        .collect();

        let mut config = BindTraceConfig::default();
        ConfigLoader::apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.logging.log_level, "warn");
        assert_eq!(config.sources.binder_source, "Other-Runtime");
        assert_eq!(config.sources.causal_flow_source, DEFAULT_CAUSAL_FLOW_SOURCE);
        assert_eq!(config.query.default_timeout_ms, 1200);
    }

    #[test]
    fn test_invalid_timeout_override_is_ignored() {
        let mut config = BindTraceConfig::default();
        ConfigLoader::apply_overrides(&mut config, |k| {
            (k == "BINDTRACE_QUERY_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.query.default_timeout_ms, 5000);
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let config = BindTraceConfig {
            logging: LoggingSettings {
                log_level: "invalid".to_string(),
            },
            ..Default::default()
        };
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_validation_same_sources() {
        let mut config = BindTraceConfig::default();
        config.sources.causal_flow_source = config.sources.binder_source.clone();
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_validation_zero_keywords() {
        let mut config = BindTraceConfig::default();
        config.sources.binder_keywords = 0;
        assert!(ConfigLoader::new().validate(&config).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = BindTraceConfig::default();
        config.query.default_timeout_ms = 42;

        let loader = ConfigLoader::new();
        loader.save(&config, &path).unwrap();
        let loaded = loader.load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new().load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
