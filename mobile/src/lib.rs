// openwearable-mobile: Native mobile bindings for iOS and Android
// This crate exports the host core API via UniFFI

pub use openwearable_core::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct NoSettings;

    impl SettingsHost for NoSettings {
        fn open_settings_panel(&self, _panel: SettingsPanel) -> Result<(), PlatformError> {
            Err(PlatformError::Unavailable {
                reason: "headless".into(),
            })
        }

        fn can_open_url(&self, _url: String) -> bool {
            false
        }

        fn open_url(&self, _url: String) -> Result<(), PlatformError> {
            Err(PlatformError::ChannelClosed)
        }
    }

    #[test]
    fn test_mobile_bridge_defaults() {
        let bridge = HostBridge::new(None, Arc::new(NoSettings), None).expect("Failed to build");
        let names = bridge.channel_names();
        assert_eq!(names.lifecycle, "edu.kit.teco.open_wearable/lifecycle");
        assert_eq!(names.open_folder, "edu.teco.open_folder");
    }

    #[test]
    fn test_mobile_lifecycle_without_runtime() {
        let bridge = HostBridge::new(None, Arc::new(NoSettings), None).unwrap();

        bridge.on_lifecycle_event(HostLifecycleEvent::Destroyed { is_finishing: true });

        let snapshot = bridge.lifecycle_snapshot();
        assert!(snapshot.termination_signaled);
        assert!(snapshot.host_finished);
    }

    #[test]
    fn test_mobile_settings_failures_stay_in_band() {
        let bridge = HostBridge::new(None, Arc::new(NoSettings), None).unwrap();
        let names = bridge.channel_names();

        let bluetooth =
            bridge.handle_method_call(names.system_settings, "openBluetoothSettings".into(), None);
        assert_eq!(bluetooth, MethodResponse::success_bool(false));

        let folder = bridge.handle_method_call(
            names.open_folder,
            "openFolder".into(),
            Some(r#"{"path": "shareddocuments:///"}"#.into()),
        );
        assert_eq!(folder.error_code(), Some("UNAVAILABLE"));
    }
}
