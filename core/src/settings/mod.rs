//! OS settings and folder navigation
//!
//! Symbolic targets are resolved here and handed to the platform's
//! `SettingsHost`; nothing is kept between calls.

pub mod launcher;
pub mod target;

pub use launcher::{
    SettingsChannel, SettingsHost, SettingsLauncher, OPEN_BLUETOOTH_SETTINGS_METHOD, OPEN_FOLDER_METHOD,
};
pub use target::{LaunchError, SettingsPanel, SettingsTarget};
