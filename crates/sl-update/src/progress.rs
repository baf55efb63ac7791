//! Multi-request update state machine.
//!
//! A run moves through selection, confirmation, any number of time-boxed
//! slices and a final report. Run state is a plain value between steps; the
//! caller decides where it is kept.

use crate::error::UpdateResult;
use crate::runner::{UpdateEngine, UpdateRunner};
use sl_core::{ModuleName, PendingUpdate, UpdateRunState};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Default wall-clock budget for one slice
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(1000);

/// Label of the selection option that skips a module
pub const NO_UPDATES_LABEL: &str = "No updates available";

/// Time spent serving the current request
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    started: Instant,
}

impl RequestTimer {
    /// Timer starting now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Timer that started at a given instant
    pub fn started_at(started: Instant) -> Self {
        Self { started }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::start()
    }
}

/// Version choices offered for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChoice {
    pub module: ModuleName,

    /// Every selectable start version, `min..=max`
    pub versions: Vec<i64>,

    /// Value of the "no updates" option, `max + 1`
    pub skip_value: i64,

    /// Pre-selected start version
    pub default_start: i64,
}

/// Outcome of one slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

impl Progress {
    /// Progress shown before the first slice runs
    pub fn starting() -> Self {
        Self {
            percent: 0,
            message: "Starting updates...".to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Wire form used by the polling script: `percent|message`
impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.percent, self.message)
    }
}

/// Drives an update run for one request
pub struct ProgressController<'a> {
    runner: UpdateRunner<'a>,
    slice_budget: Duration,
}

impl<'a> ProgressController<'a> {
    pub fn new(engine: &'a UpdateEngine, slice_budget: Duration) -> Self {
        Self {
            runner: engine.runner(),
            slice_budget,
        }
    }

    /// Version choices for every module that declares updates.
    ///
    /// The default start is the version after the installed one, raised to
    /// the module minimum. Modules never installed start at the minimum.
    pub async fn selection(&mut self) -> UpdateResult<Vec<ModuleChoice>> {
        let registry = self.runner.engine().registry();
        let mut choices = Vec::new();
        for module in registry.updatable_modules() {
            let Some((min, max)) = registry.version_range(module) else {
                continue;
            };
            let installed = self.runner.store().installed_version(module).await?;
            let default_start = match installed {
                Some(v) => (v + 1).max(min),
                None => min,
            };
            choices.push(ModuleChoice {
                module: module.clone(),
                versions: (min..=max).collect(),
                skip_value: max + 1,
                default_start,
            });
        }
        Ok(choices)
    }

    /// Confirm start versions and build the run queue.
    ///
    /// Each selected module is marked installed at `start - 1` and queued
    /// for `start..=max`. Unknown modules and starts outside
    /// `min..=max + 1` are skipped with a warning.
    pub async fn confirm(
        &mut self,
        starts: &BTreeMap<ModuleName, i64>,
    ) -> UpdateResult<UpdateRunState> {
        let registry = self.runner.engine().registry();
        let mut queue = Vec::new();
        for (module, &start) in starts {
            let Some((min, max)) = registry.version_range(module) else {
                if registry.contains(module) {
                    log::warn!("Ignoring selection for '{}': it declares no updates", module);
                } else {
                    log::warn!("Ignoring selection for unknown module '{}'", module);
                }
                continue;
            };
            if start < min || start > max + 1 {
                log::warn!(
                    "Ignoring start version {} for module '{}' (allowed {}..={})",
                    start,
                    module,
                    min,
                    max + 1
                );
                continue;
            }

            self.runner
                .store()
                .set_installed_version(module, start - 1)
                .await?;
            queue.extend((start..=max).map(|v| PendingUpdate::new(module.clone(), v)));
        }

        let state = UpdateRunState::new(queue);
        log::info!("Confirmed run {} with {} update(s)", state.run_id, state.total);
        Ok(state)
    }

    /// Apply queued updates until the queue is empty or the slice budget is
    /// spent.
    ///
    /// The budget is checked after each update, so every slice applies at
    /// least one when any remain.
    pub async fn poll(
        &mut self,
        state: &mut UpdateRunState,
        timer: &RequestTimer,
    ) -> UpdateResult<Progress> {
        let mut last_module = None;
        while let Some(done) = self.runner.apply_next(state).await? {
            last_module = Some(done.module);
            if timer.elapsed() > self.slice_budget {
                break;
            }
        }

        let message = match last_module {
            Some(module) => format!("Updating {} module", module),
            None => "No pending updates".to_string(),
        };
        Ok(Progress {
            percent: state.percent_complete(),
            message,
        })
    }
}

#[cfg(test)]
#[path = "progress_test.rs"]
mod tests;
