//! Application lifecycle coordination
//!
//! Host lifecycle callbacks and runtime requests are reduced into a small
//! state machine (`state`) and executed against the platform collaborators
//! by the `LifecycleCoordinator` (`coordinator`).

pub mod coordinator;
pub mod state;

pub use coordinator::{
    BackgroundScheduler, LifecycleCoordinator, LifecycleSnapshot, RuntimeChannel,
    APP_TERMINATING_METHOD, BEGIN_BACKGROUND_EXECUTION_METHOD, END_BACKGROUND_EXECUTION_METHOD,
};
pub use state::{
    reduce, ExtendedExecutionToken, ExtensionState, HostLifecycleEvent, LifecycleEffect,
    LifecycleInput, LifecycleState, TerminationSignal, TerminationSource,
};
