// OpenWearable Host Core: native-host bridge for the wearable app
//
// Two things live here: a lifecycle coordinator that tells the embedded
// runtime exactly once that the process is going away (and lets it borrow
// background time for sensor teardown), and a settings launcher that opens
// OS surfaces on request. Platform shells (Kotlin/Swift, or the desktop CLI)
// implement the collaborator traits and feed events in.

pub mod bridge;
pub mod channel;
pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod settings;

use thiserror::Error;

pub use bridge::HostBridge;
pub use channel::{ChannelRouter, MethodCall, MethodHandler, MethodResponse};
pub use config::{ChannelNames, ConfigError, HostConfig, LogFormat, LoggingConfig};
pub use lifecycle::{
    BackgroundScheduler, ExtendedExecutionToken, HostLifecycleEvent, LifecycleCoordinator,
    LifecycleSnapshot, RuntimeChannel, TerminationSource,
};
pub use settings::{LaunchError, SettingsHost, SettingsLauncher, SettingsPanel, SettingsTarget};

uniffi::setup_scaffolding!();

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors surfaced to the platform shell when building the bridge.
#[derive(Debug, Error, Clone, uniffi::Error)]
pub enum HostError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<ConfigError> for HostError {
    fn from(err: ConfigError) -> Self {
        HostError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}

/// Error type returned by platform collaborators (runtime channel, OS
/// scheduler, settings host).
///
/// Foreign implementations that throw something unexpected are captured as
/// `UnexpectedCallback` rather than unwinding through Rust.
#[derive(Debug, Error, Clone, PartialEq, Eq, uniffi::Error)]
pub enum PlatformError {
    #[error("Channel closed")]
    ChannelClosed,
    #[error("Unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("Platform operation failed: {reason}")]
    Failed { reason: String },
    #[error("Unexpected callback error: {reason}")]
    UnexpectedCallback { reason: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for PlatformError {
    fn from(err: uniffi::UnexpectedUniFFICallbackError) -> Self {
        PlatformError::UnexpectedCallback { reason: err.reason }
    }
}

// ============================================================================
// FFI ENTRY POINTS
// ============================================================================

/// Install the default `tracing` subscriber from the platform shell.
///
/// Safe to call more than once; later calls are ignored.
#[uniffi::export]
pub fn init_host_logging(filter: String) {
    logging::init_logging(&LoggingConfig {
        filter,
        format: LogFormat::Pretty,
    });
}

/// Default configuration as JSON, for shells that want to persist and edit it.
#[uniffi::export]
pub fn default_host_config_json() -> String {
    HostConfig::default().to_json_pretty()
}
