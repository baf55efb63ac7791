//! Page controller: maps the `op` request parameter to an update page.

use crate::error::{UpdateError, UpdateResult};
use crate::progress::{ModuleChoice, Progress, ProgressController, RequestTimer, NO_UPDATES_LABEL};
use crate::runner::UpdateEngine;
use crate::session::{validate_session_id, SessionStore};
use sl_core::ModuleName;
use sl_render::{
    FinishedView, ModuleSelection, PageRenderer, ProgressView, VersionOption, TITLE_ACCESS_DENIED,
    TITLE_ERROR, TITLE_UPDATE, TITLE_UPDATING,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Refresh target of the self-reloading progress page
pub const NOJS_PROGRESS_URL: &str = "?op=do_update_nojs";

/// Refresh target once the run is complete
pub const FINISHED_URL: &str = "?op=finished";

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Info,
    Selection,
    Update,
    DoUpdate,
    DoUpdateNoJs,
    Finished,
}

impl Op {
    /// Parse the `op` parameter. Missing or unknown values show the info page.
    pub fn parse(op: Option<&str>) -> Self {
        match op {
            Some("selection") => Op::Selection,
            Some("Update") => Op::Update,
            Some("do_update") => Op::DoUpdate,
            Some("do_update_nojs") => Op::DoUpdateNoJs,
            Some("finished") => Op::Finished,
            _ => Op::Info,
        }
    }
}

/// HTTP method of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// An update page request, detached from the HTTP framework
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub op: Op,
    pub method: Method,

    /// Whether the caller passed the admin check
    pub is_admin: bool,

    /// Form fields (`start[<module>]`, `has_js`)
    pub form: Vec<(String, String)>,
}

impl PageRequest {
    /// Build a request from query and form parameters; `op` may come from
    /// either, the query string winning.
    pub fn from_params(
        method: Method,
        is_admin: bool,
        query: &HashMap<String, String>,
        form: Vec<(String, String)>,
    ) -> Self {
        let op = query
            .get("op")
            .map(String::as_str)
            .or_else(|| form.iter().find(|(k, _)| k == "op").map(|(_, v)| v.as_str()));
        Self {
            op: Op::parse(op),
            method,
            is_admin,
            form,
        }
    }

    /// Start versions posted from the selection form.
    ///
    /// Fields with invalid module names or non-numeric values are dropped.
    pub fn start_versions(&self) -> BTreeMap<ModuleName, i64> {
        let mut starts = BTreeMap::new();
        for (key, value) in &self.form {
            let Some(module) = key
                .strip_prefix("start[")
                .and_then(|rest| rest.strip_suffix(']'))
            else {
                continue;
            };
            match (ModuleName::try_new(module), value.trim().parse::<i64>()) {
                (Some(name), Ok(version)) => {
                    starts.insert(name, version);
                }
                _ => log::warn!("Ignoring invalid start field {}={}", key, value),
            }
        }
        starts
    }

    /// Whether the browser ran the polling script
    pub fn has_js(&self) -> bool {
        self.form
            .iter()
            .any(|(k, v)| k == "has_js" && !matches!(v.as_str(), "" | "0" | "false"))
    }
}

/// Response produced by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResponse {
    /// Full HTML page
    Html {
        status: u16,
        title: String,
        body: String,

        /// Target of the meta refresh, if the page reloads itself
        refresh: Option<String>,
    },

    /// Plain text body for the polling script
    Text { status: u16, body: String },
}

impl PageResponse {
    pub fn status(&self) -> u16 {
        match self {
            PageResponse::Html { status, .. } | PageResponse::Text { status, .. } => *status,
        }
    }

    fn html(status: u16, title: &str, body: String) -> Self {
        PageResponse::Html {
            status,
            title: title.to_string(),
            body,
            refresh: None,
        }
    }
}

/// Controller settings taken from the project configuration
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub access_check: bool,
    pub slice_budget: Duration,
}

/// Serves the update pages for every session
pub struct PageController {
    engine: Arc<UpdateEngine>,
    sessions: Arc<dyn SessionStore>,
    renderer: PageRenderer,
    settings: ControllerSettings,
    run_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PageController {
    pub fn new(
        engine: Arc<UpdateEngine>,
        sessions: Arc<dyn SessionStore>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            engine,
            sessions,
            renderer: PageRenderer::new(),
            settings,
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one request for a session
    pub async fn handle(
        &self,
        session_id: &str,
        request: &PageRequest,
        timer: &RequestTimer,
    ) -> UpdateResult<PageResponse> {
        validate_session_id(session_id)?;

        if self.settings.access_check && !request.is_admin {
            log::warn!("Denied {:?} for session {}", request.op, session_id);
            return Ok(PageResponse::html(
                403,
                TITLE_ACCESS_DENIED,
                self.renderer.access_denied()?,
            ));
        }

        log::debug!("Handling {:?} for session {}", request.op, session_id);
        match request.op {
            Op::Info => Ok(PageResponse::html(200, TITLE_UPDATE, self.renderer.info()?)),
            Op::Selection => self.selection_page().await,
            Op::Update => self.update_page(session_id, request).await,
            Op::DoUpdate => self.do_update(session_id, request, timer).await,
            Op::DoUpdateNoJs => self.do_update_nojs(session_id, request, timer).await,
            Op::Finished => self.finished_page(session_id).await,
        }
    }

    async fn selection_page(&self) -> UpdateResult<PageResponse> {
        let mut progress = self.progress();
        let choices = progress.selection().await?;
        let modules: Vec<ModuleSelection> = choices.iter().map(selection_view).collect();
        Ok(PageResponse::html(
            200,
            TITLE_UPDATE,
            self.renderer.selection(&modules)?,
        ))
    }

    async fn update_page(
        &self,
        session_id: &str,
        request: &PageRequest,
    ) -> UpdateResult<PageResponse> {
        let Some(_guard) = self.try_lock_run(session_id)? else {
            return Ok(run_in_progress());
        };

        let state = self.progress().confirm(&request.start_versions()).await?;
        self.sessions.save(session_id, &state)?;

        let view = progress_view(&Progress::starting());
        if request.has_js() {
            Ok(PageResponse::html(
                200,
                TITLE_UPDATING,
                self.renderer.progress(&view)?,
            ))
        } else {
            Ok(PageResponse::Html {
                status: 200,
                title: TITLE_UPDATING.to_string(),
                body: self.renderer.progress_nojs(&view, NOJS_PROGRESS_URL)?,
                refresh: Some(NOJS_PROGRESS_URL.to_string()),
            })
        }
    }

    async fn do_update(
        &self,
        session_id: &str,
        request: &PageRequest,
        timer: &RequestTimer,
    ) -> UpdateResult<PageResponse> {
        if request.method != Method::Post {
            return Ok(PageResponse::html(
                405,
                TITLE_ERROR,
                self.renderer.error("HTTP Post is required.")?,
            ));
        }
        let Some(_guard) = self.try_lock_run(session_id)? else {
            return Ok(run_in_progress());
        };

        let progress = self.run_slice(session_id, timer).await?;
        Ok(PageResponse::Text {
            status: 200,
            body: progress.to_string(),
        })
    }

    async fn do_update_nojs(
        &self,
        session_id: &str,
        request: &PageRequest,
        timer: &RequestTimer,
    ) -> UpdateResult<PageResponse> {
        let (progress, refresh) = if request.method == Method::Post {
            // First page after the form: answer immediately
            (Progress::starting(), NOJS_PROGRESS_URL)
        } else {
            let Some(_guard) = self.try_lock_run(session_id)? else {
                return self.nojs_run_in_progress(session_id);
            };
            let progress = self.run_slice(session_id, timer).await?;
            let refresh = if progress.is_complete() {
                FINISHED_URL
            } else {
                NOJS_PROGRESS_URL
            };
            (progress, refresh)
        };

        Ok(PageResponse::Html {
            status: 200,
            title: TITLE_UPDATING.to_string(),
            body: self
                .renderer
                .progress_nojs(&progress_view(&progress), refresh)?,
            refresh: Some(refresh.to_string()),
        })
    }

    /// Busy page for the self-reloading flow: shows the saved progress and
    /// keeps refreshing until the running slice releases the lock.
    fn nojs_run_in_progress(&self, session_id: &str) -> UpdateResult<PageResponse> {
        let percent = self
            .sessions
            .load(session_id)?
            .map_or(0, |state| state.percent_complete());
        let progress = Progress {
            percent,
            message: RUN_IN_PROGRESS_LABEL.to_string(),
        };
        Ok(PageResponse::Html {
            status: 409,
            title: TITLE_UPDATING.to_string(),
            body: self
                .renderer
                .progress_nojs(&progress_view(&progress), NOJS_PROGRESS_URL)?,
            refresh: Some(NOJS_PROGRESS_URL.to_string()),
        })
    }

    async fn finished_page(&self, session_id: &str) -> UpdateResult<PageResponse> {
        let Some(_guard) = self.try_lock_run(session_id)? else {
            return Ok(run_in_progress());
        };

        let state = self.sessions.load(session_id)?;
        let view = match &state {
            Some(state) => FinishedView::from_results(
                &state.results,
                Some(state.summary()),
                !self.settings.access_check,
            ),
            None => FinishedView::from_results(
                &Default::default(),
                None,
                !self.settings.access_check,
            ),
        };
        let body = self.renderer.finished(&view)?;
        self.sessions.clear(session_id)?;
        self.forget_lock(session_id)?;

        Ok(PageResponse::html(200, TITLE_UPDATE, body))
    }

    /// Run one slice against the session's saved state.
    ///
    /// A session without state is an empty run and reports 100%.
    async fn run_slice(&self, session_id: &str, timer: &RequestTimer) -> UpdateResult<Progress> {
        let Some(mut state) = self.sessions.load(session_id)? else {
            log::debug!("No run state for session {}", session_id);
            return Ok(Progress {
                percent: 100,
                message: "No pending updates".to_string(),
            });
        };

        let result = self.progress().poll(&mut state, timer).await;
        // Keep completed slices even when the version store failed mid-slice
        self.sessions.save(session_id, &state)?;
        result
    }

    fn progress(&self) -> ProgressController<'_> {
        ProgressController::new(&self.engine, self.settings.slice_budget)
    }

    /// Take the session's run lock without waiting
    fn try_lock_run(&self, session_id: &str) -> UpdateResult<Option<OwnedMutexGuard<()>>> {
        let lock = {
            let mut locks = self
                .run_locks
                .lock()
                .map_err(|e| UpdateError::LockPoisoned(e.to_string()))?;
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        Ok(lock.try_lock_owned().ok())
    }

    fn forget_lock(&self, session_id: &str) -> UpdateResult<()> {
        self.run_locks
            .lock()
            .map_err(|e| UpdateError::LockPoisoned(e.to_string()))?
            .remove(session_id);
        Ok(())
    }
}

/// Shown while another request holds the session's run lock
const RUN_IN_PROGRESS_LABEL: &str = "An update slice is already running for this session";

fn run_in_progress() -> PageResponse {
    PageResponse::Text {
        status: 409,
        body: RUN_IN_PROGRESS_LABEL.to_string(),
    }
}

fn selection_view(choice: &ModuleChoice) -> ModuleSelection {
    let mut options: Vec<VersionOption> = choice
        .versions
        .iter()
        .map(|v| VersionOption {
            value: *v,
            label: v.to_string(),
        })
        .collect();
    options.push(VersionOption {
        value: choice.skip_value,
        label: NO_UPDATES_LABEL.to_string(),
    });
    ModuleSelection {
        module: choice.module.to_string(),
        options,
        default: choice.default_start,
    }
}

fn progress_view(progress: &Progress) -> ProgressView {
    ProgressView {
        percent: progress.percent,
        message: progress.message.clone(),
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
