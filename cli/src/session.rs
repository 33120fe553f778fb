// Interactive JSON-lines session
//
// Each stdin line is either a method call from the embedded runtime
//   {"channel": "...", "method": "...", "arguments": {...}}
// or a host lifecycle callback
//   {"event": "stop"} / {"event": "expire", "token": 1}
// Answers, and anything the host pushes to the runtime, go to stdout as one
// JSON object per line.

use crate::simulate::{apply_step, parse_step};
use anyhow::{Context, Result};
use openwearable_core::{
    HostBridge, HostLifecycleEvent, LifecycleSnapshot, PlatformError, RuntimeChannel,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SessionLine {
    Call {
        channel: String,
        method: String,
        #[serde(default)]
        arguments: Option<Value>,
    },
    Event {
        event: String,
        #[serde(default)]
        token: Option<u64>,
    },
}

/// Stand-in for the embedded runtime: prints what the host sends it.
pub struct StdoutRuntime;

impl RuntimeChannel for StdoutRuntime {
    fn invoke_method(
        &self,
        method: String,
        arguments_json: Option<String>,
    ) -> Result<(), PlatformError> {
        let arguments = arguments_json
            .and_then(|json| serde_json::from_str::<Value>(&json).ok())
            .unwrap_or(Value::Null);
        emit(&json!({ "to_runtime": { "method": method, "arguments": arguments } }));
        Ok(())
    }
}

pub fn emit(value: &Value) {
    println!("{}", value);
}

pub fn snapshot_json(snapshot: &LifecycleSnapshot) -> Value {
    json!({
        "termination_signaled": snapshot.termination_signaled,
        "termination_source": snapshot.termination_source.map(|s| s.as_tag()),
        "active_token": snapshot.active_token,
        "extension_pending": snapshot.extension_pending,
        "runtime_attached": snapshot.runtime_attached,
        "host_finished": snapshot.host_finished,
    })
}

/// Handle one input line and produce the line to print
pub fn handle_line(bridge: &HostBridge, line: &str) -> Value {
    let parsed: SessionLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => return json!({ "error": format!("Unrecognized line: {}", e) }),
    };

    match parsed {
        SessionLine::Call {
            channel,
            method,
            arguments,
        } => {
            let response = bridge.handle_method_call(
                channel.clone(),
                method.clone(),
                arguments.map(|a| a.to_string()),
            );
            json!({ "channel": channel, "method": method, "response": response.to_json() })
        }
        SessionLine::Event { event, token } => {
            let step_name = match (event.as_str(), token) {
                ("expire", Some(token)) => format!("expire:{}", token),
                _ => event.clone(),
            };
            match parse_step(&step_name) {
                Ok(step) => {
                    apply_step(&bridge.lifecycle(), step);
                    json!({ "event": event, "lifecycle": snapshot_json(&bridge.lifecycle_snapshot()) })
                }
                Err(e) => json!({ "error": e.to_string() }),
            }
        }
    }
}

/// The host is going away for good: stop, then destroy, both finishing.
pub fn finish_host(bridge: &HostBridge) {
    bridge.on_lifecycle_event(HostLifecycleEvent::Stopped {
        is_finishing: true,
        is_changing_configurations: false,
    });
    bridge.on_lifecycle_event(HostLifecycleEvent::Destroyed { is_finishing: true });
}

pub async fn run_session(
    bridge: Arc<HostBridge>,
    mut expired_rx: mpsc::UnboundedReceiver<u64>,
) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => emit(&handle_line(&bridge, &line)),
                    None => break,
                }
            }
            Some(token) = expired_rx.recv() => {
                tracing::info!("Background budget for token {} exhausted", token);
                bridge.on_lifecycle_event(HostLifecycleEvent::ExtendedExecutionExpired { token });
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    finish_host(&bridge);
    emit(&json!({ "lifecycle": snapshot_json(&bridge.lifecycle_snapshot()) }));
    Ok(())
}
