// Scripted lifecycle steps
//
// The `simulate` command and the `run` session both describe host callbacks
// and runtime requests with the same short step names.

use anyhow::{bail, Context, Result};
use openwearable_core::{HostLifecycleEvent, LifecycleCoordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Host(HostLifecycleEvent),
    Begin,
    End,
    /// Expire whatever token is active when the step runs
    ExpireActive,
}

pub const STEP_NAMES: &[&str] = &[
    "background",
    "foreground",
    "stop",
    "stop-rotate",
    "destroy",
    "destroy-rotate",
    "begin",
    "end",
    "expire",
    "expire:<token>",
];

pub fn parse_step(step: &str) -> Result<Step> {
    let step = step.trim();
    if let Some(token) = step.strip_prefix("expire:") {
        let token = token.parse().context("Invalid token in expire step")?;
        return Ok(Step::Host(HostLifecycleEvent::ExtendedExecutionExpired { token }));
    }

    Ok(match step {
        "background" => Step::Host(HostLifecycleEvent::EnteredBackground),
        "foreground" => Step::Host(HostLifecycleEvent::EnteredForeground),
        "stop" => Step::Host(HostLifecycleEvent::Stopped {
            is_finishing: true,
            is_changing_configurations: false,
        }),
        "stop-rotate" => Step::Host(HostLifecycleEvent::Stopped {
            is_finishing: false,
            is_changing_configurations: true,
        }),
        "destroy" => Step::Host(HostLifecycleEvent::Destroyed { is_finishing: true }),
        "destroy-rotate" => Step::Host(HostLifecycleEvent::Destroyed {
            is_finishing: false,
        }),
        "begin" => Step::Begin,
        "end" => Step::End,
        "expire" => Step::ExpireActive,
        other => bail!(
            "Unknown step '{}' (expected one of: {})",
            other,
            STEP_NAMES.join(", ")
        ),
    })
}

pub fn apply_step(coordinator: &LifecycleCoordinator, step: Step) {
    match step {
        Step::Host(event) => coordinator.on_host_event(event),
        Step::Begin => {
            coordinator.begin_extended_execution();
        }
        Step::End => {
            coordinator.end_extended_execution();
        }
        Step::ExpireActive => {
            if let Some(token) = coordinator.snapshot().active_token {
                coordinator.on_host_event(HostLifecycleEvent::ExtendedExecutionExpired { token });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            parse_step("stop").unwrap(),
            Step::Host(HostLifecycleEvent::Stopped {
                is_finishing: true,
                is_changing_configurations: false,
            })
        );
        assert_eq!(parse_step(" begin ").unwrap(), Step::Begin);
        assert_eq!(
            parse_step("expire:4").unwrap(),
            Step::Host(HostLifecycleEvent::ExtendedExecutionExpired { token: 4 })
        );
        assert_eq!(parse_step("expire").unwrap(), Step::ExpireActive);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse_step("reboot").is_err());
        assert!(parse_step("expire:soon").is_err());
    }

    #[test]
    fn test_expire_active_without_token_is_noop() {
        let coordinator = LifecycleCoordinator::new(None);
        apply_step(&coordinator, Step::ExpireActive);
        assert_eq!(coordinator.snapshot().active_token, None);
    }
}
