//! sl-update - Update engine for Sluice
//!
//! The registry knows which schema versions each module declares and the
//! routine for each. The runner applies one update at a time. The progress
//! controller splits a run into time-boxed slices across requests, and the
//! page controller exposes that state machine as update pages.

pub mod controller;
pub mod error;
pub mod progress;
pub mod registry;
pub mod runner;
pub mod session;

#[cfg(test)]
mod test_support;

pub use controller::{
    ControllerSettings, Method, Op, PageController, PageRequest, PageResponse, FINISHED_URL,
    NOJS_PROGRESS_URL,
};
pub use error::{UpdateError, UpdateResult};
pub use progress::{
    ModuleChoice, Progress, ProgressController, RequestTimer, DEFAULT_SLICE_BUDGET,
    NO_UPDATES_LABEL,
};
pub use registry::{StepRoutine, UpdateContext, UpdateRegistry, UpdateRoutine};
pub use runner::{UpdateEngine, UpdateRunner};
pub use session::{validate_session_id, FileSessionStore, MemorySessionStore, SessionStore};
