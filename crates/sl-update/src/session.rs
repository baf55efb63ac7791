//! Session-scoped storage for update run state

use crate::error::{UpdateError, UpdateResult};
use sl_core::UpdateRunState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value storage for run state, keyed by session id
pub trait SessionStore: Send + Sync {
    /// State saved for the session, if any
    fn load(&self, session_id: &str) -> UpdateResult<Option<UpdateRunState>>;

    /// Replace the session's state
    fn save(&self, session_id: &str, state: &UpdateRunState) -> UpdateResult<()>;

    /// Forget the session's state. Clearing an empty session is not an error.
    fn clear(&self, session_id: &str) -> UpdateResult<()>;
}

/// Reject session ids that could escape a file name
pub fn validate_session_id(session_id: &str) -> UpdateResult<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(UpdateError::InvalidSessionId(session_id.to_string()))
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    states: Mutex<HashMap<String, UpdateRunState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
        session_id: &str,
    ) -> UpdateResult<std::sync::MutexGuard<'_, HashMap<String, UpdateRunState>>> {
        validate_session_id(session_id)?;
        self.states.lock().map_err(|e| UpdateError::SessionStorage {
            session: session_id.to_string(),
            message: e.to_string(),
        })
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session_id: &str) -> UpdateResult<Option<UpdateRunState>> {
        Ok(self.lock(session_id)?.get(session_id).cloned())
    }

    fn save(&self, session_id: &str, state: &UpdateRunState) -> UpdateResult<()> {
        self.lock(session_id)?
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }

    fn clear(&self, session_id: &str) -> UpdateResult<()> {
        self.lock(session_id)?.remove(session_id);
        Ok(())
    }
}

/// One JSON file per session under a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> UpdateResult<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }

    fn storage_error(session_id: &str, err: impl ToString) -> UpdateError {
        UpdateError::SessionStorage {
            session: session_id.to_string(),
            message: err.to_string(),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, session_id: &str) -> UpdateResult<Option<UpdateRunState>> {
        let path = self.path_for(session_id)?;
        UpdateRunState::load(&path).map_err(|e| Self::storage_error(session_id, e))
    }

    fn save(&self, session_id: &str, state: &UpdateRunState) -> UpdateResult<()> {
        let path = self.path_for(session_id)?;
        state
            .save(&path)
            .map_err(|e| Self::storage_error(session_id, e))
    }

    fn clear(&self, session_id: &str) -> UpdateResult<()> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::storage_error(session_id, e)),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
