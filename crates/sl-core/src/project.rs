//! Project loading: configuration plus discovered module definitions.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::module::{discover_modules, ModuleDef};
use std::path::{Path, PathBuf};

/// A loaded Sluice project
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Parsed sluice.yml
    pub config: Config,

    /// Module definitions, sorted by name
    pub modules: Vec<ModuleDef>,
}

impl Project {
    /// Load a project from its root directory
    pub fn load(root: &Path) -> CoreResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::ProjectNotFound {
                path: root.display().to_string(),
            });
        }
        let config = Config::load_from_dir(root)?;
        Self::with_config(root, config)
    }

    /// Build a project from an already loaded configuration
    pub fn with_config(root: &Path, config: Config) -> CoreResult<Self> {
        let modules = discover_modules(&config.module_paths_absolute(root))?;
        log::debug!(
            "Loaded project '{}' with {} module(s)",
            config.name,
            modules.len()
        );
        Ok(Self {
            root: root.to_path_buf(),
            config,
            modules,
        })
    }

    /// Look up a module by name
    pub fn get_module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Names of all discovered modules
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }
}
