use crate::channel::{INVALID_ARGUMENT, UNAVAILABLE};
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("{message}")]
    InvalidArgument { message: String },
    #[error("{message}")]
    Unavailable { message: String },
}

impl LaunchError {
    /// Machine-readable code reported over the method channel
    pub fn code(&self) -> &'static str {
        match self {
            LaunchError::InvalidArgument { .. } => INVALID_ARGUMENT,
            LaunchError::Unavailable { .. } => UNAVAILABLE,
        }
    }

    pub(crate) fn invalid_path() -> Self {
        LaunchError::InvalidArgument {
            message: "Invalid folder path".to_string(),
        }
    }

    pub(crate) fn cannot_open(what: &str) -> Self {
        LaunchError::Unavailable {
            message: format!("Cannot open folder {}", what),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum SettingsPanel {
    Bluetooth,
}

impl std::fmt::Display for SettingsPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsPanel::Bluetooth => write!(f, "Bluetooth"),
        }
    }
}

/// Something the launcher can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsTarget {
    Panel(SettingsPanel),
    Folder(Url),
}

impl SettingsTarget {
    /// Resolve a folder reference: an absolute URL with a scheme, or an
    /// absolute filesystem path (turned into a `file://` URL).
    pub fn folder(path: &str) -> Result<Self, LaunchError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(LaunchError::invalid_path());
        }

        match Url::parse(trimmed) {
            Ok(url) => Ok(SettingsTarget::Folder(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) if Path::new(trimmed).is_absolute() => {
                Url::from_file_path(trimmed)
                    .map(SettingsTarget::Folder)
                    .map_err(|_| LaunchError::invalid_path())
            }
            Err(_) => Err(LaunchError::invalid_path()),
        }
    }
}

impl std::fmt::Display for SettingsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsTarget::Panel(panel) => write!(f, "{} settings", panel),
            SettingsTarget::Folder(url) => write!(f, "{}", url),
        }
    }
}
