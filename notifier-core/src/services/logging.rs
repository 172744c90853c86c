//! Logging service

use crate::models::LogLevel;
use tracing_subscriber::EnvFilter;

/// Build the filter for a level; `RUST_LOG` takes precedence when set
pub fn build_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "notifier={level},notifier_core={level}",
            level = level.as_str()
        ))
    })
}

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stderr)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_names_both_crates() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = build_filter(LogLevel::Debug).to_string();
        assert!(filter.contains("notifier=debug"));
        assert!(filter.contains("notifier_core=debug"));
    }

    #[test]
    fn test_logging_initialization() {
        // A second initialization in the same process reports an error instead of panicking
        let _ = init_logging(LogLevel::Info);
        assert!(init_logging(LogLevel::Info).is_err());
    }
}
