use super::target::{LaunchError, SettingsPanel, SettingsTarget};
use crate::channel::{MethodCall, MethodHandler, MethodResponse};
use crate::PlatformError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub const OPEN_BLUETOOTH_SETTINGS_METHOD: &str = "openBluetoothSettings";
pub const OPEN_FOLDER_METHOD: &str = "openFolder";

/// Platform navigation capabilities (implemented by the Kotlin/Swift shell
/// or the desktop host).
#[uniffi::export(with_foreign)]
pub trait SettingsHost: Send + Sync {
    fn open_settings_panel(&self, panel: SettingsPanel) -> Result<(), PlatformError>;
    fn can_open_url(&self, url: String) -> bool;
    fn open_url(&self, url: String) -> Result<(), PlatformError>;
}

pub struct SettingsLauncher {
    host: Arc<dyn SettingsHost>,
}

impl SettingsLauncher {
    pub fn new(host: Arc<dyn SettingsHost>) -> Self {
        Self { host }
    }

    /// Never fails across the bridge: any failure is reported as `false`.
    pub fn open_bluetooth_settings(&self) -> bool {
        match self.open(&SettingsTarget::Panel(SettingsPanel::Bluetooth)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Bluetooth settings not opened: {}", e);
                false
            }
        }
    }

    /// Errors name the reference as resolved, without surrounding whitespace.
    pub fn open_folder(&self, path: &str) -> Result<(), LaunchError> {
        let path = path.trim();
        let target = SettingsTarget::folder(path)?;
        self.open(&target).map_err(|e| match e {
            LaunchError::Unavailable { .. } => LaunchError::cannot_open(path),
            other => other,
        })
    }

    pub fn open(&self, target: &SettingsTarget) -> Result<(), LaunchError> {
        match target {
            SettingsTarget::Panel(panel) => {
                let panel = *panel;
                guarded(|| self.host.open_settings_panel(panel)).map_err(|reason| {
                    LaunchError::Unavailable {
                        message: format!("Cannot open {} settings: {}", panel, reason),
                    }
                })?;
            }
            SettingsTarget::Folder(url) => {
                let url = url.to_string();
                let openable = catch_unwind(AssertUnwindSafe(|| self.host.can_open_url(url.clone())))
                    .unwrap_or(false);
                if !openable {
                    return Err(LaunchError::cannot_open(&url));
                }
                guarded(|| self.host.open_url(url.clone()))
                    .map_err(|_| LaunchError::cannot_open(&url))?;
            }
        }

        tracing::info!("Opened {}", target);
        Ok(())
    }
}

/// Run a host call, folding both errors and panics into a reason string.
fn guarded(f: impl FnOnce() -> Result<(), PlatformError>) -> Result<(), String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("platform call panicked".to_string()),
    }
}

impl MethodHandler for SettingsLauncher {
    fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            OPEN_BLUETOOTH_SETTINGS_METHOD => {
                MethodResponse::success_bool(self.open_bluetooth_settings())
            }
            OPEN_FOLDER_METHOD => {
                let Some(path) = call.arg_str("path") else {
                    return MethodResponse::error(
                        LaunchError::invalid_path().code(),
                        "Missing folder path",
                    );
                };
                match self.open_folder(path) {
                    Ok(()) => MethodResponse::success_empty(),
                    Err(e) => MethodResponse::error(e.code(), e.to_string()),
                }
            }
            _ => MethodResponse::NotImplemented,
        }
    }
}

/// The launcher as seen from one method channel: only that channel's
/// methods are answered, anything else is not-implemented.
pub struct SettingsChannel {
    launcher: Arc<SettingsLauncher>,
    methods: &'static [&'static str],
}

impl SettingsChannel {
    pub fn system_settings(launcher: Arc<SettingsLauncher>) -> Self {
        Self {
            launcher,
            methods: &[OPEN_BLUETOOTH_SETTINGS_METHOD],
        }
    }

    pub fn open_folder(launcher: Arc<SettingsLauncher>) -> Self {
        Self {
            launcher,
            methods: &[OPEN_FOLDER_METHOD],
        }
    }
}

impl MethodHandler for SettingsChannel {
    fn handle(&self, call: &MethodCall) -> MethodResponse {
        if self.methods.contains(&call.method.as_str()) {
            self.launcher.handle(call)
        } else {
            MethodResponse::NotImplemented
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{INVALID_ARGUMENT, UNAVAILABLE};
    use parking_lot::Mutex;

    /// Host that can open anything except URLs with an "unreachable" host.
    #[derive(Default)]
    struct FakeHost {
        bluetooth_fails: bool,
        opened: Mutex<Vec<String>>,
    }

    impl SettingsHost for FakeHost {
        fn open_settings_panel(&self, panel: SettingsPanel) -> Result<(), PlatformError> {
            if self.bluetooth_fails {
                return Err(PlatformError::Failed {
                    reason: "ActivityNotFoundException".into(),
                });
            }
            self.opened.lock().push(panel.to_string());
            Ok(())
        }

        fn can_open_url(&self, url: String) -> bool {
            !url.contains("unreachable")
        }

        fn open_url(&self, url: String) -> Result<(), PlatformError> {
            self.opened.lock().push(url);
            Ok(())
        }
    }

    struct PanickingHost;

    impl SettingsHost for PanickingHost {
        fn open_settings_panel(&self, _: SettingsPanel) -> Result<(), PlatformError> {
            panic!("no activity context");
        }

        fn can_open_url(&self, _: String) -> bool {
            panic!("no application context");
        }

        fn open_url(&self, _: String) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    mockall::mock! {
        Host {}
        impl SettingsHost for Host {
            fn open_settings_panel(&self, panel: SettingsPanel) -> Result<(), PlatformError>;
            fn can_open_url(&self, url: String) -> bool;
            fn open_url(&self, url: String) -> Result<(), PlatformError>;
        }
    }

    #[test]
    fn test_bluetooth_success() {
        let host = Arc::new(FakeHost::default());
        let launcher = SettingsLauncher::new(host.clone());
        assert!(launcher.open_bluetooth_settings());
        assert_eq!(*host.opened.lock(), vec!["Bluetooth".to_string()]);
    }

    #[test]
    fn test_bluetooth_failure_is_false() {
        let launcher = SettingsLauncher::new(Arc::new(FakeHost {
            bluetooth_fails: true,
            ..Default::default()
        }));
        assert!(!launcher.open_bluetooth_settings());
    }

    #[test]
    fn test_bluetooth_panic_is_false() {
        let launcher = SettingsLauncher::new(Arc::new(PanickingHost));
        assert!(!launcher.open_bluetooth_settings());
    }

    #[test]
    fn test_open_folder_success() {
        let host = Arc::new(FakeHost::default());
        let launcher = SettingsLauncher::new(host.clone());
        launcher.open_folder("shareddocuments:///recordings").unwrap();
        assert_eq!(*host.opened.lock(), vec!["shareddocuments:///recordings".to_string()]);
    }

    #[test]
    fn test_open_folder_invalid() {
        let launcher = SettingsLauncher::new(Arc::new(FakeHost::default()));
        assert_eq!(launcher.open_folder("").unwrap_err().code(), INVALID_ARGUMENT);
        assert_eq!(launcher.open_folder("::::").unwrap_err().code(), INVALID_ARGUMENT);
    }

    #[test]
    fn test_open_folder_unavailable_names_path() {
        let launcher = SettingsLauncher::new(Arc::new(FakeHost::default()));
        let err = launcher.open_folder("scheme://unreachable").unwrap_err();
        assert_eq!(err.code(), UNAVAILABLE);
        assert_eq!(err.to_string(), "Cannot open folder scheme://unreachable");
    }

    #[test]
    fn test_open_folder_error_names_resolved_path() {
        let host = Arc::new(FakeHost::default());
        let launcher = SettingsLauncher::new(host.clone());

        let err = launcher.open_folder("  scheme://unreachable\n").unwrap_err();
        assert_eq!(err.to_string(), "Cannot open folder scheme://unreachable");

        launcher.open_folder(" shareddocuments:///recordings ").unwrap();
        assert_eq!(*host.opened.lock(), vec!["shareddocuments:///recordings".to_string()]);
    }

    #[test]
    fn test_capability_check_panic_is_unavailable() {
        let launcher = SettingsLauncher::new(Arc::new(PanickingHost));
        let err = launcher.open_folder("scheme://anything").unwrap_err();
        assert_eq!(err.code(), UNAVAILABLE);
    }

    #[test]
    fn test_open_url_failure_is_unavailable() {
        let mut host = MockHost::new();
        host.expect_can_open_url().times(1).returning(|_| true);
        host.expect_open_url().times(1).returning(|_| {
            Err(PlatformError::Failed {
                reason: "no handler".into(),
            })
        });

        let launcher = SettingsLauncher::new(Arc::new(host));
        let err = launcher.open_folder("content://downloads").unwrap_err();
        assert_eq!(err, LaunchError::cannot_open("content://downloads"));
    }

    #[test]
    fn test_invalid_path_never_reaches_host() {
        let mut host = MockHost::new();
        host.expect_can_open_url().never();
        host.expect_open_url().never();

        let launcher = SettingsLauncher::new(Arc::new(host));
        let response = launcher.handle(&MethodCall::with_arguments(
            OPEN_FOLDER_METHOD,
            serde_json::json!({ "path": "" }),
        ));
        assert_eq!(response.error_code(), Some(INVALID_ARGUMENT));
    }

    #[test]
    fn test_channels_answer_only_their_own_method() {
        let launcher = Arc::new(SettingsLauncher::new(Arc::new(FakeHost::default())));
        let settings = SettingsChannel::system_settings(launcher.clone());
        let folders = SettingsChannel::open_folder(launcher);
        let open_folder = MethodCall::with_arguments(
            OPEN_FOLDER_METHOD,
            serde_json::json!({ "path": "scheme://ok" }),
        );
        let bluetooth = MethodCall::new(OPEN_BLUETOOTH_SETTINGS_METHOD);

        assert_eq!(settings.handle(&bluetooth), MethodResponse::success_bool(true));
        assert_eq!(settings.handle(&open_folder), MethodResponse::NotImplemented);
        assert_eq!(folders.handle(&open_folder), MethodResponse::success_empty());
        assert_eq!(folders.handle(&bluetooth), MethodResponse::NotImplemented);
    }

    #[test]
    fn test_handler_responses() {
        let launcher = SettingsLauncher::new(Arc::new(FakeHost::default()));

        assert_eq!(
            launcher.handle(&MethodCall::new(OPEN_BLUETOOTH_SETTINGS_METHOD)),
            MethodResponse::success_bool(true)
        );
        assert_eq!(
            launcher.handle(&MethodCall::with_arguments(
                OPEN_FOLDER_METHOD,
                serde_json::json!({ "path": "scheme://ok" })
            )),
            MethodResponse::success_empty()
        );
        assert_eq!(
            launcher
                .handle(&MethodCall::new(OPEN_FOLDER_METHOD))
                .error_code(),
            Some(INVALID_ARGUMENT)
        );
        assert_eq!(
            launcher.handle(&MethodCall::new("openWifiSettings")),
            MethodResponse::NotImplemented
        );
    }
}
