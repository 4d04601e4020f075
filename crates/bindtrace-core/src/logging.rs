//! Logging initialisation

use anyhow::{anyhow, Context};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parse a configured log level name
pub fn parse_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("unknown log level: {}", other)),
    }
}

fn subscriber(level: Level) -> FmtSubscriber {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false)
        .finish()
}

/// Install a global fmt subscriber at the given level
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(subscriber(parse_level(level)?))
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}

/// Like [`init_logging`], but a subscriber that is already installed is not an error.
/// Meant for tests, where every test may try to initialise logging. An unknown
/// level is still reported.
pub fn try_init_logging(level: &str) -> anyhow::Result<()> {
    let level = parse_level(level)?;
    let _ = tracing::subscriber::set_global_default(subscriber(level));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("warn").unwrap(), Level::WARN);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_try_init_is_repeatable() {
        try_init_logging("debug").unwrap();
        try_init_logging("debug").unwrap();
    }

    #[test]
    fn test_try_init_reports_unknown_level() {
        let err = try_init_logging("loud").unwrap_err();
        assert!(err.to_string().contains("unknown log level: loud"));
    }
}
