//! Tracing subscriber setup shared by the mobile shells and the desktop CLI.

use crate::config::{LogFormat, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install a stderr subscriber (idempotent).
///
/// Stdout is left to the host's own output. Returns false when a global
/// subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!("Logging initialized with filter {:?}", config.filter);
    }
    installed
}

/// Install a subscriber that writes to a daily-rolling file in `dir`.
///
/// The returned guard flushes buffered lines on drop and must be held for
/// the life of the process. `None` when a subscriber was already installed.
pub fn init_file_logging(config: &LoggingConfig, dir: &Path) -> Option<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(dir, "openwearable-host.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_ansi(false)
        .with_writer(writer);
    let installed = match config.format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    installed.then_some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_ignored() {
        let config = LoggingConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
