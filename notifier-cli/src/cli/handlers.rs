//! CLI command handlers

use crate::cli::notify::NotifyArgs;
use anyhow::{Context, Result};
use notifier_core::models::{
    DispatchConfig, FileDefaults, HttpMethod, LogLevel, DEFAULT_MAX_IN_FLIGHT,
};
use notifier_core::pipeline;
use notifier_core::services::logging;
use notifier_core::shutdown::{self, TerminationReason};
use notifier_core::source::MessageInput;
use notifier_core::transport::ReqwestSender;
use std::path::Path;
use std::sync::Arc;

/// Settings after merging flags, the config file and built-in defaults
#[derive(Debug)]
pub struct ResolvedSettings {
    pub config: DispatchConfig,
    pub log_level: LogLevel,
}

/// Handle the 'notify' command
pub async fn handle_notify(args: NotifyArgs) -> Result<TerminationReason> {
    let file_defaults = load_file_defaults(args.config.as_deref())?;
    let settings = resolve_settings(&args, &file_defaults)?;

    if let Err(e) = logging::init_logging(settings.log_level) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!(
        url = %settings.config.url,
        interval = ?settings.config.interval,
        args = args.messages.len(),
        "notify called"
    );

    let sender = ReqwestSender::new(settings.config.request_timeout)
        .context("Failed to create HTTP client")?;
    let input = MessageInput::from_args_or_stdin(args.messages);

    let reason = pipeline::run(
        settings.config,
        Arc::new(sender),
        input,
        shutdown::os_interrupt(),
    )
    .await?;

    tracing::info!(%reason, "Notifier finished");
    Ok(reason)
}

/// Load the config file. An explicitly named file must exist; the default
/// location is optional.
pub fn load_file_defaults(explicit: Option<&Path>) -> Result<FileDefaults> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            FileDefaults::load_from_file(path).context("Failed to load config file")
        }
        None => match FileDefaults::default_config_path() {
            Some(path) => {
                FileDefaults::load_from_file(&path).context("Failed to load config file")
            }
            None => Ok(FileDefaults::default()),
        },
    }
}

/// Merge flags over file values over built-in defaults
pub fn resolve_settings(args: &NotifyArgs, file: &FileDefaults) -> Result<ResolvedSettings> {
    let method = match &args.method {
        Some(raw) => raw
            .parse::<HttpMethod>()
            .map_err(|e| anyhow::anyhow!("Invalid --method: {}", e))?,
        None => file.method.unwrap_or_default(),
    };

    let log_level = match &args.log_level {
        Some(raw) => raw
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!("Invalid --log-level: {}", e))?,
        None => file.log_level.unwrap_or_default(),
    };

    let max_in_flight = args
        .max_threads
        .or(file.max_threads)
        .unwrap_or(DEFAULT_MAX_IN_FLIGHT);

    let config = DispatchConfig::new(&args.url, args.interval)
        .context("Invalid --url")?
        .with_method(method)
        .with_max_in_flight(max_in_flight)
        .with_request_timeout(args.request_timeout.or(file.request_timeout))
        .with_shutdown_grace(args.shutdown_grace.or(file.shutdown_grace));

    config.validate().context("Invalid configuration")?;

    Ok(ResolvedSettings { config, log_level })
}
