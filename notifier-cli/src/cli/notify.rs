use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments of the `notify` command
#[derive(Args, Debug, Clone)]
pub struct NotifyArgs {
    /// Url to notify
    #[arg(short, long)]
    pub url: String,

    /// Minimum time between requests, e.g. 5s, 250ms, 0
    #[arg(short, long, value_parser = parse_duration)]
    pub interval: Duration,

    /// HTTP method to use [default: POST]
    #[arg(short, long)]
    pub method: Option<String>,

    /// Maximum number of requests in flight [default: 3]
    #[arg(short = 't', long = "max-threads")]
    pub max_threads: Option<usize>,

    /// Per-request timeout, e.g. 10s (no timeout when unset)
    #[arg(long, value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// On interrupt, wait this long for in-flight requests before exiting
    #[arg(long, value_parser = parse_duration)]
    pub shutdown_grace: Option<Duration>,

    /// Log level (error, warn, info, debug, trace) [default: info]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to configuration file [default: ~/.config/notifier/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Messages to send; standard input is read line by line when omitted
    pub messages: Vec<String>,
}

/// Parse a human-readable duration; a bare `0` means no delay
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(value).map_err(|e| format!("invalid duration '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }
}
