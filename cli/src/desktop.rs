// Desktop implementations of the platform collaborators
//
// Settings surfaces and folders are opened through the platform's opener
// command. Background time is a wall-clock budget enforced with a tokio
// timer; when it runs out the token is reported on `expired_tx`, the same
// way a mobile OS calls the expiration handler.

use openwearable_core::{BackgroundScheduler, PlatformError, SettingsHost, SettingsPanel};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

// ============================================================================
// SETTINGS
// ============================================================================

pub struct DesktopSettingsHost {
    opener: Option<String>,
}

impl DesktopSettingsHost {
    pub fn new(opener: Option<String>) -> Self {
        Self { opener }
    }

    fn opener_command(&self) -> (String, Vec<String>) {
        if let Some(opener) = &self.opener {
            return (opener.clone(), Vec::new());
        }
        if cfg!(target_os = "macos") {
            ("open".to_string(), Vec::new())
        } else if cfg!(target_os = "windows") {
            (
                "cmd".to_string(),
                vec!["/C".to_string(), "start".to_string(), String::new()],
            )
        } else {
            ("xdg-open".to_string(), Vec::new())
        }
    }

    /// Candidate commands for a settings panel, tried in order
    fn panel_commands(&self, panel: SettingsPanel) -> Vec<(String, Vec<String>)> {
        match panel {
            SettingsPanel::Bluetooth => {
                if cfg!(target_os = "macos") {
                    vec![(
                        "open".to_string(),
                        vec!["x-apple.systempreferences:com.apple.BluetoothSettings".to_string()],
                    )]
                } else if cfg!(target_os = "windows") {
                    vec![(
                        "cmd".to_string(),
                        vec![
                            "/C".to_string(),
                            "start".to_string(),
                            String::new(),
                            "ms-settings:bluetooth".to_string(),
                        ],
                    )]
                } else {
                    vec![
                        ("gnome-control-center".to_string(), vec!["bluetooth".to_string()]),
                        ("blueman-manager".to_string(), Vec::new()),
                        ("systemsettings".to_string(), vec!["kcm_bluetooth".to_string()]),
                    ]
                }
            }
        }
    }
}

/// Launch a detached GUI program; success means it started.
fn spawn_detached(program: &str, args: &[String]) -> Result<(), PlatformError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| PlatformError::Failed {
            reason: format!("{}: {}", program, e),
        })
}

impl SettingsHost for DesktopSettingsHost {
    fn open_settings_panel(&self, panel: SettingsPanel) -> Result<(), PlatformError> {
        let mut last_error = PlatformError::Unavailable {
            reason: format!("no launcher for {} settings", panel),
        };
        for (program, args) in self.panel_commands(panel) {
            match spawn_detached(&program, &args) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!("{} settings via {} failed: {}", panel, program, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    fn can_open_url(&self, url: String) -> bool {
        match Url::parse(&url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map(|path| Path::new(&path).exists())
                .unwrap_or(false),
            Ok(_) => true,
            Err(_) => false,
        }
    }

    fn open_url(&self, url: String) -> Result<(), PlatformError> {
        let (program, mut args) = self.opener_command();
        args.push(url);

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| PlatformError::Failed {
                reason: format!("{}: {}", program, e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::Failed {
                reason: format!("{} exited with {}", program, status),
            })
        }
    }
}

// ============================================================================
// BACKGROUND TIME
// ============================================================================

pub struct DesktopScheduler {
    budget: Duration,
    runtime: tokio::runtime::Handle,
    expired_tx: mpsc::UnboundedSender<u64>,
    next_token: AtomicU64,
    timers: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl DesktopScheduler {
    /// Must be created inside a tokio runtime.
    pub fn new(budget: Duration, expired_tx: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            budget,
            runtime: tokio::runtime::Handle::current(),
            expired_tx,
            next_token: AtomicU64::new(0),
            timers: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_tokens(&self) -> usize {
        self.timers.lock().len()
    }
}

impl BackgroundScheduler for DesktopScheduler {
    fn begin_background_task(&self) -> Result<u64, PlatformError> {
        if self.budget.is_zero() {
            return Err(PlatformError::Unavailable {
                reason: "background budget is zero".to_string(),
            });
        }

        let token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let budget = self.budget;
        let expired_tx = self.expired_tx.clone();
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(budget).await;
            let _ = expired_tx.send(token);
        });

        self.timers.lock().insert(token, timer);
        tracing::debug!("Background task {} granted for {:?}", token, budget);
        Ok(token)
    }

    fn end_background_task(&self, token: u64) -> Result<(), PlatformError> {
        if let Some(timer) = self.timers.lock().remove(&token) {
            timer.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scheduler_expires_tokens() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = DesktopScheduler::new(Duration::from_millis(10), tx);

        let token = scheduler.begin_background_task().unwrap();
        assert_eq!(token, 1);
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_scheduler_end_cancels_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = DesktopScheduler::new(Duration::from_millis(20), tx);

        let token = scheduler.begin_background_task().unwrap();
        scheduler.end_background_task(token).unwrap();
        assert_eq!(scheduler.live_tokens(), 0);

        drop(scheduler);
        // Every sender is gone once the aborted timer is dropped.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_zero_budget_refuses() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let scheduler = DesktopScheduler::new(Duration::ZERO, tx);
        assert!(matches!(
            scheduler.begin_background_task(),
            Err(PlatformError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_can_open_existing_directory_only() {
        let dir = tempfile::tempdir().unwrap();
        let host = DesktopSettingsHost::new(None);

        let existing = Url::from_file_path(dir.path()).unwrap().to_string();
        let missing = Url::from_file_path(dir.path().join("gone")).unwrap().to_string();

        assert!(host.can_open_url(existing));
        assert!(!host.can_open_url(missing));
        assert!(!host.can_open_url("not a url".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_opener_exit_status() {
        let ok = DesktopSettingsHost::new(Some("true".to_string()));
        let failing = DesktopSettingsHost::new(Some("false".to_string()));

        assert!(ok.open_url("file:///".to_string()).is_ok());
        assert!(matches!(
            failing.open_url("file:///".to_string()),
            Err(PlatformError::Failed { .. })
        ));
    }
}
