use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Send tracing output to the log file; the terminal belongs to the TUI.
/// `RUST_LOG` wins over the configured filter.
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let log_file = std::fs::File::create(&cfg.file)
        .with_context(|| format!("failed to create log file {}", cfg.file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;
    Ok(())
}
