// owhost: OpenWearable desktop host
//
// Cross-platform (macOS, Linux, Windows) host for the settings launcher and
// the lifecycle bridge, for driving the embedded-runtime protocol without a
// phone.

mod config;
mod desktop;
mod session;
mod simulate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use openwearable_core::{logging, HostBridge, LifecycleCoordinator, MethodResponse};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "owhost")]
#[command(about = "OpenWearable desktop host: settings launcher and lifecycle bridge", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the Bluetooth settings surface
    Bluetooth,
    /// Open a folder path or URL
    OpenFolder { path: String },
    /// Send one method-channel call through the bridge
    Call {
        channel: String,
        method: String,
        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },
    /// Replay lifecycle steps (background, stop, stop-rotate, destroy, begin, end, expire, ...)
    Simulate {
        #[arg(required = true)]
        steps: Vec<String>,
    },
    /// Interactive JSON-lines session on stdin/stdout
    Run,
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::Config::config_file()?,
    };
    let config = config::Config::load(&config_path)?;

    let _log_guard = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            logging::init_file_logging(&config.host.logging, std::path::Path::new(dir))
        }
        None => {
            logging::init_logging(&config.host.logging);
            None
        }
    };

    match cli.command {
        Commands::Bluetooth => cmd_bluetooth(&config),
        Commands::OpenFolder { path } => cmd_open_folder(&config, &path),
        Commands::Call {
            channel,
            method,
            args,
        } => cmd_call(&config, channel, method, args),
        Commands::Simulate { steps } => cmd_simulate(&steps),
        Commands::Run => cmd_run(&config).await,
        Commands::Config { action } => cmd_config(config, &config_path, action),
    }
}

fn build_bridge(config: &config::Config) -> Arc<HostBridge> {
    let settings = Arc::new(desktop::DesktopSettingsHost::new(config.opener.clone()));
    Arc::new(HostBridge::with_config(config.host.clone(), settings, None))
}

fn cmd_bluetooth(config: &config::Config) -> Result<()> {
    let bridge = build_bridge(config);
    let opened = bridge.launcher().open_bluetooth_settings();
    if opened {
        println!("{}", "true".green());
    } else {
        println!("{}", "false".red());
        tracing::info!("Bluetooth settings could not be opened; see the warning above");
    }
    Ok(())
}

fn cmd_open_folder(config: &config::Config, path: &str) -> Result<()> {
    let bridge = build_bridge(config);
    match bridge.launcher().open_folder(path) {
        Ok(()) => println!("{} Opened {}", "✓".green(), path),
        Err(e) => println!("{} {}: {}", "✗".red(), e.code().bold(), e),
    }
    Ok(())
}

fn cmd_call(
    config: &config::Config,
    channel: String,
    method: String,
    args: Option<String>,
) -> Result<()> {
    let bridge = build_bridge(config);
    bridge.attach_runtime(Arc::new(session::StdoutRuntime));

    let response = bridge.handle_method_call(channel, method, args);
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);

    if let MethodResponse::NotImplemented = response {
        println!(
            "{} Known channels: {}",
            "→".bright_blue(),
            bridge.router().channels().join(", ")
        );
    }
    Ok(())
}

fn cmd_simulate(steps: &[String]) -> Result<()> {
    let steps = steps
        .iter()
        .map(|s| simulate::parse_step(s))
        .collect::<Result<Vec<_>>>()?;

    // Tokens here are bookkeeping only; nothing expires on its own.
    let scheduler = Arc::new(SimulatedScheduler::default());
    let coordinator = LifecycleCoordinator::new(Some(scheduler));
    coordinator.attach_runtime(Arc::new(session::StdoutRuntime));

    for step in steps {
        println!("{} {:?}", "→".bright_blue(), step);
        simulate::apply_step(&coordinator, step);
    }

    println!();
    println!("{}", "Final state:".bold());
    println!(
        "{}",
        serde_json::to_string_pretty(&session::snapshot_json(&coordinator.snapshot()))?
    );
    Ok(())
}

async fn cmd_run(config: &config::Config) -> Result<()> {
    let (expired_tx, expired_rx) = tokio::sync::mpsc::unbounded_channel();
    let scheduler = Arc::new(desktop::DesktopScheduler::new(
        Duration::from_secs(config.background_budget_secs),
        expired_tx,
    ));
    let settings = Arc::new(desktop::DesktopSettingsHost::new(config.opener.clone()));

    let bridge = Arc::new(HostBridge::with_config(
        config.host.clone(),
        settings,
        Some(scheduler),
    ));
    bridge.attach_runtime(Arc::new(session::StdoutRuntime));

    eprintln!("{}", "OpenWearable host session started".bold());
    eprintln!(
        "  channels: {}",
        bridge.router().channels().join(", ").bright_cyan()
    );
    eprintln!(
        "  background budget: {}s (Ctrl-C or EOF ends the session)",
        config.background_budget_secs
    );

    session::run_session(bridge, expired_rx).await
}

fn cmd_config(mut config: config::Config, path: &std::path::Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save(path)?;
            println!("{} {} = {}", "✓".green(), key, value);
        }
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{}", value),
            None => println!("{} {} is not set", "→".bright_blue(), key),
        },
        ConfigAction::List => {
            for (key, value) in config.list() {
                println!("  {:<26} {}", key.bright_cyan(), value);
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

/// Scheduler for `simulate`: hands out sequential tokens and logs releases.
#[derive(Default)]
struct SimulatedScheduler {
    next: std::sync::atomic::AtomicU64,
}

impl openwearable_core::BackgroundScheduler for SimulatedScheduler {
    fn begin_background_task(&self) -> Result<u64, openwearable_core::PlatformError> {
        let token = self.next.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        println!("  {} background task {} granted", "✓".green(), token);
        Ok(token)
    }

    fn end_background_task(&self, token: u64) -> Result<(), openwearable_core::PlatformError> {
        println!("  {} background task {} released", "✓".green(), token);
        Ok(())
    }
}
