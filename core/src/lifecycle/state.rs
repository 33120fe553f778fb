//! Lifecycle state machine
//!
//! `reduce` is the only place lifecycle state changes. It is pure: it takes
//! one input, mutates the state, and returns the effects the coordinator has
//! to carry out against the platform.

use serde::{Deserialize, Serialize};

/// What triggered the termination notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum TerminationSource {
    /// Host stopped while finishing, not because of a configuration change
    HostStopping,
    /// Host fully destroyed while finishing
    HostDestroyed,
}

impl TerminationSource {
    /// Tag sent to the embedded runtime in the `source` argument
    pub fn as_tag(&self) -> &'static str {
        match self {
            TerminationSource::HostStopping => "host_stopping",
            TerminationSource::HostDestroyed => "host_destroyed",
        }
    }
}

impl std::fmt::Display for TerminationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Callbacks from the host OS, as the platform shell reports them.
///
/// The shell supplies the "finishing" and "configuration change" facts; the
/// core has no way to work them out itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum HostLifecycleEvent {
    EnteredBackground,
    EnteredForeground,
    Stopped {
        is_finishing: bool,
        is_changing_configurations: bool,
    },
    Destroyed {
        is_finishing: bool,
    },
    /// The OS revoked an extended-execution grant
    ExtendedExecutionExpired {
        token: u64,
    },
}

/// Handle for an OS background-execution grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedExecutionToken(pub u64);

/// One-shot termination fact. Never goes back to unsignaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationSignal {
    signaled: bool,
    source: Option<TerminationSource>,
}

impl TerminationSignal {
    pub fn is_signaled(&self) -> bool {
        self.signaled
    }

    pub fn source(&self) -> Option<TerminationSource> {
        self.source
    }

    /// Returns true only on the transition from unsignaled.
    pub fn fire(&mut self, source: TerminationSource) -> bool {
        if self.signaled {
            return false;
        }
        self.signaled = true;
        self.source = Some(source);
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtensionState {
    #[default]
    Idle,
    /// A request is out to the OS. `release_on_grant` is set when the
    /// runtime ended the extension before the grant came back; `expired`
    /// holds a token the OS revoked before its grant was reported.
    Requesting {
        release_on_grant: bool,
        expired: Option<ExtendedExecutionToken>,
    },
    Active(ExtendedExecutionToken),
    /// The token is being handed back. No new request goes out until the
    /// release has returned; `begin_after` records a begin made meanwhile.
    Releasing {
        token: ExtendedExecutionToken,
        begin_after: bool,
    },
}

impl ExtensionState {
    const REQUESTING: ExtensionState = ExtensionState::Requesting {
        release_on_grant: false,
        expired: None,
    };

    fn releasing(token: ExtendedExecutionToken) -> Self {
        ExtensionState::Releasing {
            token,
            begin_after: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub termination: TerminationSignal,
    pub extension: ExtensionState,
    pub runtime_attached: bool,
    /// Set by a finishing destroy; later begin requests are no-ops
    pub host_finished: bool,
}

impl LifecycleState {
    pub fn active_token(&self) -> Option<ExtendedExecutionToken> {
        match self.extension {
            ExtensionState::Active(token) => Some(token),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleInput {
    Host(HostLifecycleEvent),
    /// Explicit termination from a host with a direct "will terminate" hook
    Terminate(TerminationSource),
    RuntimeAttached,
    RuntimeDetached,
    BeginExtension,
    EndExtension,
    ExtensionGranted(ExtendedExecutionToken),
    ExtensionDenied,
    /// The scheduler call releasing this token has returned
    ExtensionReleased(ExtendedExecutionToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEffect {
    DeliverTermination(TerminationSource),
    RequestExtension,
    ReleaseExtension(ExtendedExecutionToken),
    DetachRuntime,
}

pub fn reduce(state: &mut LifecycleState, input: LifecycleInput) -> Vec<LifecycleEffect> {
    match input {
        LifecycleInput::Host(event) => reduce_host_event(state, event),
        LifecycleInput::Terminate(source) => notify_terminating(state, source),
        LifecycleInput::RuntimeAttached => {
            state.runtime_attached = true;
            Vec::new()
        }
        LifecycleInput::RuntimeDetached => detach(state),
        LifecycleInput::BeginExtension => begin_extension(state),
        LifecycleInput::EndExtension => end_extension(state),
        LifecycleInput::ExtensionGranted(token) => extension_granted(state, token),
        LifecycleInput::ExtensionDenied => {
            if let ExtensionState::Requesting { .. } = state.extension {
                state.extension = ExtensionState::Idle;
            }
            Vec::new()
        }
        LifecycleInput::ExtensionReleased(token) => extension_released(state, token),
    }
}

fn reduce_host_event(state: &mut LifecycleState, event: HostLifecycleEvent) -> Vec<LifecycleEffect> {
    match event {
        HostLifecycleEvent::EnteredBackground | HostLifecycleEvent::EnteredForeground => Vec::new(),
        HostLifecycleEvent::Stopped {
            is_finishing,
            is_changing_configurations,
        } => {
            if is_finishing && !is_changing_configurations {
                notify_terminating(state, TerminationSource::HostStopping)
            } else {
                Vec::new()
            }
        }
        HostLifecycleEvent::Destroyed { is_finishing } => {
            let mut effects = Vec::new();
            if is_finishing {
                state.host_finished = true;
                effects.extend(notify_terminating(state, TerminationSource::HostDestroyed));
            }
            effects.extend(detach(state));
            effects
        }
        HostLifecycleEvent::ExtendedExecutionExpired { token } => {
            let token = ExtendedExecutionToken(token);
            match state.extension {
                ExtensionState::Active(active) if active == token => {
                    state.extension = ExtensionState::releasing(token);
                    vec![LifecycleEffect::ReleaseExtension(token)]
                }
                // The grant for this token has not been reported yet.
                ExtensionState::Requesting {
                    release_on_grant, ..
                } => {
                    state.extension = ExtensionState::Requesting {
                        release_on_grant,
                        expired: Some(token),
                    };
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
    }
}

fn notify_terminating(state: &mut LifecycleState, source: TerminationSource) -> Vec<LifecycleEffect> {
    if state.termination.fire(source) {
        vec![LifecycleEffect::DeliverTermination(source)]
    } else {
        Vec::new()
    }
}

fn detach(state: &mut LifecycleState) -> Vec<LifecycleEffect> {
    if state.runtime_attached {
        state.runtime_attached = false;
        vec![LifecycleEffect::DetachRuntime]
    } else {
        Vec::new()
    }
}

fn begin_extension(state: &mut LifecycleState) -> Vec<LifecycleEffect> {
    if state.host_finished {
        return Vec::new();
    }
    match state.extension {
        ExtensionState::Idle => {
            state.extension = ExtensionState::REQUESTING;
            vec![LifecycleEffect::RequestExtension]
        }
        ExtensionState::Requesting { expired, .. } => {
            state.extension = ExtensionState::Requesting {
                release_on_grant: false,
                expired,
            };
            Vec::new()
        }
        ExtensionState::Releasing { token, .. } => {
            state.extension = ExtensionState::Releasing {
                token,
                begin_after: true,
            };
            Vec::new()
        }
        ExtensionState::Active(_) => Vec::new(),
    }
}

fn end_extension(state: &mut LifecycleState) -> Vec<LifecycleEffect> {
    match state.extension {
        ExtensionState::Active(token) => {
            state.extension = ExtensionState::releasing(token);
            vec![LifecycleEffect::ReleaseExtension(token)]
        }
        ExtensionState::Requesting { expired, .. } => {
            state.extension = ExtensionState::Requesting {
                release_on_grant: true,
                expired,
            };
            Vec::new()
        }
        ExtensionState::Releasing { token, .. } => {
            state.extension = ExtensionState::releasing(token);
            Vec::new()
        }
        ExtensionState::Idle => Vec::new(),
    }
}

fn extension_granted(
    state: &mut LifecycleState,
    token: ExtendedExecutionToken,
) -> Vec<LifecycleEffect> {
    match state.extension {
        ExtensionState::Requesting {
            release_on_grant,
            expired,
        } => {
            if release_on_grant || expired == Some(token) {
                state.extension = ExtensionState::releasing(token);
                vec![LifecycleEffect::ReleaseExtension(token)]
            } else {
                state.extension = ExtensionState::Active(token);
                Vec::new()
            }
        }
        ExtensionState::Idle => {
            state.extension = ExtensionState::releasing(token);
            vec![LifecycleEffect::ReleaseExtension(token)]
        }
        // Nobody asked for this grant; hand it straight back.
        ExtensionState::Active(_) | ExtensionState::Releasing { .. } => {
            vec![LifecycleEffect::ReleaseExtension(token)]
        }
    }
}

fn extension_released(
    state: &mut LifecycleState,
    token: ExtendedExecutionToken,
) -> Vec<LifecycleEffect> {
    match state.extension {
        ExtensionState::Releasing {
            token: releasing,
            begin_after,
        } if releasing == token => {
            if begin_after && !state.host_finished {
                state.extension = ExtensionState::REQUESTING;
                vec![LifecycleEffect::RequestExtension]
            } else {
                state.extension = ExtensionState::Idle;
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}
