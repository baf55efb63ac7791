//! Configuration types and parsing for sluice.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from sluice.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name, shown in page titles
    pub name: String,

    /// Directories containing module definition files
    #[serde(default = "default_module_paths")]
    pub module_paths: Vec<String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Whether update pages require the administrator.
    ///
    /// Turn this off only to recover from a lost admin token, and turn it back
    /// on as soon as the update has finished.
    #[serde(default = "default_true")]
    pub access_check: bool,

    /// Token identifying the administrator (cookie or `token` query parameter)
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Wall-clock budget for one slice of updates, in milliseconds
    #[serde(default = "default_slice_budget_ms")]
    pub slice_budget_ms: u64,

    /// Directory holding file-backed update sessions
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the database file (`:memory:` for an in-memory database)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQL dialect used by the column mutation helpers
    #[serde(default)]
    pub dialect: DatabaseDialect,

    /// Prefix prepended to every table name, including the system catalog
    #[serde(default)]
    pub table_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            dialect: DatabaseDialect::default(),
            table_prefix: String::new(),
        }
    }
}

/// SQL dialect the schema mutation helpers emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDialect {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// PostgreSQL
    Postgres,
    /// MySQL / MariaDB
    MySql,
}

impl std::fmt::Display for DatabaseDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseDialect::DuckDb => write!(f, "duckdb"),
            DatabaseDialect::Postgres => write!(f, "postgres"),
            DatabaseDialect::MySql => write!(f, "mysql"),
        }
    }
}

impl std::str::FromStr for DatabaseDialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(DatabaseDialect::DuckDb),
            "postgres" | "postgresql" | "pgsql" => Ok(DatabaseDialect::Postgres),
            "mysql" | "mysqli" | "mariadb" => Ok(DatabaseDialect::MySql),
            other => Err(CoreError::ConfigInvalid {
                message: format!(
                    "Unknown database dialect '{}'. Expected duckdb, postgres or mysql",
                    other
                ),
            }),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_module_paths() -> Vec<String> {
    vec!["modules".to_string()]
}

fn default_db_path() -> String {
    "sluice.duckdb".to_string()
}

fn default_slice_budget_ms() -> u64 {
    1000
}

fn default_session_dir() -> String {
    "target/sessions".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sluice.yml or sluice.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("sluice.yml");
        let yaml_path = dir.join("sluice.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.module_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one module_paths entry must be specified".to_string(),
            });
        }

        if self.access_check && self.admin_token.as_deref().map_or(true, str::is_empty) {
            log::warn!(
                "access_check is enabled but no admin_token is set; update pages will deny every request"
            );
        }

        let prefix = &self.database.table_prefix;
        if !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "table_prefix '{}' may only contain letters, digits and underscores",
                    prefix
                ),
            });
        }

        Ok(())
    }

    /// Module directories resolved against the project root
    pub fn module_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.module_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Session directory resolved against the project root
    pub fn session_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.session_dir)
    }

    /// Database path resolved against the project root.
    ///
    /// `:memory:` is passed through unchanged.
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == ":memory:" {
            return self.database.path.clone();
        }
        let path = Path::new(&self.database.path);
        if path.is_absolute() {
            self.database.path.clone()
        } else {
            root.join(path).display().to_string()
        }
    }

    /// Whether `token` identifies the administrator
    pub fn is_admin_token(&self, token: &str) -> bool {
        matches!(
            self.admin_token.as_deref(),
            Some(expected) if !expected.is_empty() && expected == token
        )
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
