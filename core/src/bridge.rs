// Host bridge: the one object a platform shell instantiates
//
// Wires the settings launcher and the lifecycle coordinator onto their
// method channels and exposes the whole thing through UniFFI.

use crate::channel::{ChannelRouter, MethodResponse};
use crate::config::{ChannelNames, HostConfig};
use crate::lifecycle::{
    BackgroundScheduler, HostLifecycleEvent, LifecycleCoordinator, LifecycleSnapshot,
    RuntimeChannel,
};
use crate::settings::{SettingsChannel, SettingsHost, SettingsLauncher};
use crate::HostError;
use std::sync::Arc;

#[derive(uniffi::Object)]
pub struct HostBridge {
    config: HostConfig,
    lifecycle: Arc<LifecycleCoordinator>,
    launcher: Arc<SettingsLauncher>,
    router: ChannelRouter,
}

#[uniffi::export]
impl HostBridge {
    /// `config_json` may be `None` for defaults.
    #[uniffi::constructor]
    pub fn new(
        config_json: Option<String>,
        settings_host: Arc<dyn SettingsHost>,
        scheduler: Option<Arc<dyn BackgroundScheduler>>,
    ) -> Result<Arc<Self>, HostError> {
        let config = match config_json {
            Some(json) => HostConfig::from_json(&json)?,
            None => HostConfig::default(),
        };
        Ok(Arc::new(Self::with_config(config, settings_host, scheduler)))
    }

    pub fn attach_runtime(&self, runtime: Arc<dyn RuntimeChannel>) {
        self.lifecycle.attach_runtime(runtime);
    }

    /// Answer an inbound method call from the embedded runtime
    pub fn handle_method_call(
        &self,
        channel: String,
        method: String,
        arguments_json: Option<String>,
    ) -> MethodResponse {
        let response = self
            .router
            .dispatch_json(&channel, &method, arguments_json.as_deref());
        tracing::debug!("{}#{} -> {:?}", channel, method, response);
        response
    }

    pub fn on_lifecycle_event(&self, event: HostLifecycleEvent) {
        self.lifecycle.on_host_event(event);
    }

    pub fn lifecycle(&self) -> Arc<LifecycleCoordinator> {
        self.lifecycle.clone()
    }

    pub fn lifecycle_snapshot(&self) -> LifecycleSnapshot {
        self.lifecycle.snapshot()
    }

    pub fn channel_names(&self) -> ChannelNames {
        self.config.channels.clone()
    }
}

impl HostBridge {
    pub fn with_config(
        config: HostConfig,
        settings_host: Arc<dyn SettingsHost>,
        scheduler: Option<Arc<dyn BackgroundScheduler>>,
    ) -> Self {
        let lifecycle = LifecycleCoordinator::new(scheduler);
        let launcher = Arc::new(SettingsLauncher::new(settings_host));

        let channels = &config.channels;
        let mut router = ChannelRouter::new();
        if channels.system_settings == channels.open_folder {
            router.register(channels.system_settings.clone(), launcher.clone());
        } else {
            router.register(
                channels.system_settings.clone(),
                Arc::new(SettingsChannel::system_settings(launcher.clone())),
            );
            router.register(
                channels.open_folder.clone(),
                Arc::new(SettingsChannel::open_folder(launcher.clone())),
            );
        }
        router.register(channels.lifecycle.clone(), lifecycle.clone());

        tracing::info!("Host bridge ready on channels {:?}", router.channels());

        Self {
            config,
            lifecycle,
            launcher,
            router,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn launcher(&self) -> &SettingsLauncher {
        &self.launcher
    }

    pub fn router(&self) -> &ChannelRouter {
        &self.router
    }
}
