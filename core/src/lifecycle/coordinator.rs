//! Lifecycle coordinator
//!
//! Owns the termination signal and the extended-execution grant for the
//! life of the process. Reducer calls are serialized behind a mutex; the
//! resulting effects run after the lock is released so a platform callback
//! that re-enters the coordinator cannot deadlock it.

use super::state::{
    reduce, ExtendedExecutionToken, ExtensionState, HostLifecycleEvent, LifecycleEffect,
    LifecycleInput, LifecycleState, TerminationSource,
};
use crate::channel::{MethodCall, MethodHandler, MethodResponse};
use crate::PlatformError;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub const APP_TERMINATING_METHOD: &str = "appTerminating";
pub const BEGIN_BACKGROUND_EXECUTION_METHOD: &str = "beginBackgroundExecution";
pub const END_BACKGROUND_EXECUTION_METHOD: &str = "endBackgroundExecution";

/// Outbound half of the lifecycle channel (host → embedded runtime).
#[uniffi::export(with_foreign)]
pub trait RuntimeChannel: Send + Sync {
    fn invoke_method(
        &self,
        method: String,
        arguments_json: Option<String>,
    ) -> Result<(), PlatformError>;
}

/// The OS facility that keeps the process running past suspension.
///
/// When the OS revokes a grant, the platform shell reports it back as
/// `HostLifecycleEvent::ExtendedExecutionExpired`.
#[uniffi::export(with_foreign)]
pub trait BackgroundScheduler: Send + Sync {
    fn begin_background_task(&self) -> Result<u64, PlatformError>;
    fn end_background_task(&self, token: u64) -> Result<(), PlatformError>;
}

/// Read-only view of the coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct LifecycleSnapshot {
    pub termination_signaled: bool,
    pub termination_source: Option<TerminationSource>,
    pub active_token: Option<u64>,
    pub extension_pending: bool,
    pub runtime_attached: bool,
    pub host_finished: bool,
}

struct Inner {
    state: LifecycleState,
    runtime: Option<Arc<dyn RuntimeChannel>>,
}

/// Effects resolved against `Inner` while the lock is held.
enum Outbound {
    Deliver(Arc<dyn RuntimeChannel>, TerminationSource),
    Request,
    Release(ExtendedExecutionToken),
}

#[derive(uniffi::Object)]
pub struct LifecycleCoordinator {
    inner: Mutex<Inner>,
    scheduler: Option<Arc<dyn BackgroundScheduler>>,
}

#[uniffi::export]
impl LifecycleCoordinator {
    /// `scheduler` is `None` on hosts without a background-time facility;
    /// extension requests are then accepted and do nothing.
    #[uniffi::constructor]
    pub fn new(scheduler: Option<Arc<dyn BackgroundScheduler>>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state: LifecycleState::default(),
                runtime: None,
            }),
            scheduler,
        })
    }

    /// Attach (or replace) the outbound runtime channel, e.g. when the host
    /// view is recreated. The termination signal is not reset.
    pub fn attach_runtime(&self, runtime: Arc<dyn RuntimeChannel>) {
        self.inner.lock().runtime = Some(runtime);
        self.dispatch(LifecycleInput::RuntimeAttached);
        tracing::debug!("Runtime channel attached");
    }

    pub fn detach_runtime(&self) {
        self.dispatch(LifecycleInput::RuntimeDetached);
    }

    /// Feed one host OS callback into the coordinator
    pub fn on_host_event(&self, event: HostLifecycleEvent) {
        match event {
            HostLifecycleEvent::EnteredBackground => tracing::info!("Host entered background"),
            HostLifecycleEvent::EnteredForeground => tracing::info!("Host entered foreground"),
            _ => tracing::debug!("Host lifecycle event: {:?}", event),
        }
        self.dispatch(LifecycleInput::Host(event));
    }

    /// Always returns true, including for redundant requests.
    pub fn begin_extended_execution(&self) -> bool {
        self.dispatch(LifecycleInput::BeginExtension);
        true
    }

    /// Always returns true, including when nothing is active.
    pub fn end_extended_execution(&self) -> bool {
        self.dispatch(LifecycleInput::EndExtension);
        true
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        let inner = self.inner.lock();
        let state = &inner.state;
        LifecycleSnapshot {
            termination_signaled: state.termination.is_signaled(),
            termination_source: state.termination.source(),
            active_token: state.active_token().map(|t| t.0),
            extension_pending: matches!(state.extension, ExtensionState::Requesting { .. }),
            runtime_attached: state.runtime_attached,
            host_finished: state.host_finished,
        }
    }
}

impl LifecycleCoordinator {
    /// Signal termination directly, for hosts that expose a "will
    /// terminate" hook instead of stop/destroy callbacks. Idempotent.
    pub fn notify_terminating(&self, source: TerminationSource) {
        self.dispatch(LifecycleInput::Terminate(source));
    }

    fn dispatch(&self, input: LifecycleInput) {
        let mut pending = vec![input];
        while let Some(input) = pending.pop() {
            let outbound = {
                let mut inner = self.inner.lock();
                let effects = reduce(&mut inner.state, input);
                resolve(&mut inner, effects)
            };
            for action in outbound {
                if let Some(next) = self.execute(action) {
                    pending.push(next);
                }
            }
        }
    }

    fn execute(&self, action: Outbound) -> Option<LifecycleInput> {
        match action {
            Outbound::Deliver(runtime, source) => {
                deliver_termination(runtime.as_ref(), source);
                None
            }
            Outbound::Request => Some(self.request_extension()),
            Outbound::Release(token) => {
                self.release_extension(token);
                Some(LifecycleInput::ExtensionReleased(token))
            }
        }
    }

    fn request_extension(&self) -> LifecycleInput {
        let Some(scheduler) = self.scheduler.as_ref() else {
            tracing::debug!("No background scheduler on this host; extension not requested");
            return LifecycleInput::ExtensionDenied;
        };

        match catch_unwind(AssertUnwindSafe(|| scheduler.begin_background_task())) {
            Ok(Ok(token)) => {
                tracing::info!("Extended execution granted (token {})", token);
                LifecycleInput::ExtensionGranted(ExtendedExecutionToken(token))
            }
            Ok(Err(e)) => {
                tracing::warn!("Extended execution refused: {}", e);
                LifecycleInput::ExtensionDenied
            }
            Err(_) => {
                tracing::warn!("Background scheduler panicked while granting extension");
                LifecycleInput::ExtensionDenied
            }
        }
    }

    fn release_extension(&self, token: ExtendedExecutionToken) {
        let Some(scheduler) = self.scheduler.as_ref() else {
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| scheduler.end_background_task(token.0))) {
            Ok(Ok(())) => tracing::info!("Extended execution released (token {})", token.0),
            Ok(Err(e)) => tracing::warn!("Releasing token {} failed: {}", token.0, e),
            Err(_) => tracing::warn!("Background scheduler panicked releasing token {}", token.0),
        }
    }
}

fn resolve(inner: &mut Inner, effects: Vec<LifecycleEffect>) -> Vec<Outbound> {
    let mut outbound = Vec::with_capacity(effects.len());
    for effect in effects {
        match effect {
            LifecycleEffect::DeliverTermination(source) => match inner.runtime.clone() {
                Some(runtime) => outbound.push(Outbound::Deliver(runtime, source)),
                None => tracing::warn!(
                    "Termination ({}) signaled with no runtime attached; notification dropped",
                    source
                ),
            },
            LifecycleEffect::RequestExtension => outbound.push(Outbound::Request),
            LifecycleEffect::ReleaseExtension(token) => outbound.push(Outbound::Release(token)),
            LifecycleEffect::DetachRuntime => {
                inner.runtime = None;
                tracing::debug!("Runtime channel detached");
            }
        }
    }
    outbound
}

/// Best effort: the runtime may already be gone while the process tears down.
fn deliver_termination(runtime: &dyn RuntimeChannel, source: TerminationSource) {
    let arguments = serde_json::json!({ "source": source.as_tag() }).to_string();
    let result = catch_unwind(AssertUnwindSafe(|| {
        runtime.invoke_method(APP_TERMINATING_METHOD.to_string(), Some(arguments))
    }));

    match result {
        Ok(Ok(())) => tracing::info!("Sent {} (source: {})", APP_TERMINATING_METHOD, source),
        Ok(Err(e)) => tracing::warn!("{} not delivered: {}", APP_TERMINATING_METHOD, e),
        Err(_) => tracing::warn!("Runtime channel panicked delivering {}", APP_TERMINATING_METHOD),
    }
}

impl MethodHandler for LifecycleCoordinator {
    fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            BEGIN_BACKGROUND_EXECUTION_METHOD => {
                MethodResponse::success_bool(self.begin_extended_execution())
            }
            END_BACKGROUND_EXECUTION_METHOD => {
                MethodResponse::success_bool(self.end_extended_execution())
            }
            _ => MethodResponse::NotImplemented,
        }
    }
}
