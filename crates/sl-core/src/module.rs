//! Module definitions and discovery
//!
//! A module is declared in a `.yml` file with `kind: module`. It names its
//! schema version range and lists the update steps that move its tables from
//! version N-1 to N:
//!
//! ```yaml
//! kind: module
//! name: comment
//! schema_version: 5
//! updates:
//!   4:
//!     - add_column:
//!         table: comments
//!         column: thread
//!         type: varchar(255)
//!         not_null: true
//!         default: "''"
//!   5:
//!     - sql: UPDATE {comments} SET status = 0 WHERE status IS NULL
//! ```
//!
//! `{table}` placeholders in raw SQL steps are replaced with the prefixed
//! table name when the step runs.

use crate::error::{CoreError, CoreResult};
use crate::module_name::ModuleName;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Discriminator for module YAML files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Module,
}

/// Column attributes understood by the mutation helpers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
    /// Add a NOT NULL constraint
    pub not_null: bool,

    /// Default value as SQL literal text (`'abc'`, `0`, `NULL`)
    pub default: Option<String>,
}

/// A single step inside a module update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub enum UpdateStep {
    /// Raw SQL statement
    Sql(String),

    /// Add a column to an existing table
    AddColumn {
        table: String,
        column: String,
        column_type: String,
        options: ColumnOptions,
    },

    /// Rename a column's data into a newly typed column
    ChangeColumn {
        table: String,
        column: String,
        new_column: String,
        column_type: String,
        options: ColumnOptions,
    },
}

/// YAML shape of a step: exactly one of the keys must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    add_column: Option<RawAddColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    change_column: Option<RawChangeColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAddColumn {
    table: String,
    column: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    not_null: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_sql_literal",
        skip_serializing_if = "Option::is_none"
    )]
    default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChangeColumn {
    table: String,
    column: String,
    /// Defaults to `column` when omitted
    #[serde(default)]
    new_column: Option<String>,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    not_null: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_sql_literal",
        skip_serializing_if = "Option::is_none"
    )]
    default: Option<String>,
}

/// Accept strings, numbers and booleans as SQL literal text.
///
/// Only called when the key is present: an explicit YAML null (`NULL`,
/// `null`, `~`) is the SQL literal NULL, an absent key is no default.
fn deserialize_sql_literal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::Null => Ok(Some("NULL".to_string())),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(if b { "TRUE" } else { "FALSE" }.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "default must be a scalar SQL literal, found {:?}",
            other
        ))),
    }
}

impl TryFrom<RawStep> for UpdateStep {
    type Error = String;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        match (raw.sql, raw.add_column, raw.change_column) {
            (Some(sql), None, None) => {
                if sql.trim().is_empty() {
                    Err("sql step must not be empty".to_string())
                } else {
                    Ok(UpdateStep::Sql(sql))
                }
            }
            (None, Some(add), None) => Ok(UpdateStep::AddColumn {
                table: add.table,
                column: add.column,
                column_type: add.column_type,
                options: ColumnOptions {
                    not_null: add.not_null,
                    default: add.default,
                },
            }),
            (None, None, Some(change)) => Ok(UpdateStep::ChangeColumn {
                table: change.table,
                new_column: change.new_column.unwrap_or_else(|| change.column.clone()),
                column: change.column,
                column_type: change.column_type,
                options: ColumnOptions {
                    not_null: change.not_null,
                    default: change.default,
                },
            }),
            _ => Err(
                "each update step must set exactly one of: sql, add_column, change_column"
                    .to_string(),
            ),
        }
    }
}

impl From<UpdateStep> for RawStep {
    fn from(step: UpdateStep) -> Self {
        match step {
            UpdateStep::Sql(sql) => RawStep {
                sql: Some(sql),
                ..Default::default()
            },
            UpdateStep::AddColumn {
                table,
                column,
                column_type,
                options,
            } => RawStep {
                add_column: Some(RawAddColumn {
                    table,
                    column,
                    column_type,
                    not_null: options.not_null,
                    default: options.default,
                }),
                ..Default::default()
            },
            UpdateStep::ChangeColumn {
                table,
                column,
                new_column,
                column_type,
                options,
            } => RawStep {
                change_column: Some(RawChangeColumn {
                    table,
                    column,
                    new_column: Some(new_column),
                    column_type,
                    not_null: options.not_null,
                    default: options.default,
                }),
                ..Default::default()
            },
        }
    }
}

/// YAML schema of a module file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleSchema {
    #[allow(dead_code)]
    kind: ModuleKind,
    name: ModuleName,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    schema_version: Option<i64>,
    #[serde(default)]
    schema_min: Option<i64>,
    #[serde(default)]
    updates: BTreeMap<i64, Vec<UpdateStep>>,
}

/// A module loaded from its definition file
#[derive(Debug, Clone)]
pub struct ModuleDef {
    /// Module name (catalog key)
    pub name: ModuleName,

    /// Human-readable description
    pub description: Option<String>,

    /// Declared maximum schema version
    pub schema_version: Option<i64>,

    /// Declared minimum schema version still supported
    pub schema_min: Option<i64>,

    /// Update steps keyed by the version they migrate to
    pub updates: BTreeMap<i64, Vec<UpdateStep>>,

    /// File the module was loaded from
    pub path: PathBuf,
}

impl ModuleDef {
    /// Load a module definition from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse a module definition from YAML text
    pub fn parse(content: &str, path: &Path) -> CoreResult<Self> {
        let schema: ModuleSchema =
            serde_yaml::from_str(content).map_err(|e| CoreError::ModuleParseError {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        let module = Self {
            name: schema.name,
            description: schema.description,
            schema_version: schema.schema_version,
            schema_min: schema.schema_min,
            updates: schema.updates,
            path: path.to_path_buf(),
        };
        module.validate()?;
        Ok(module)
    }

    fn validate(&self) -> CoreResult<()> {
        let Some(max) = self.declared_max() else {
            return Ok(());
        };
        let min = self.schema_min.unwrap_or(1);
        if min > max {
            return Err(CoreError::InvalidVersionRange {
                module: self.name.to_string(),
                min,
                max,
            });
        }
        if let Some(&version) = self.updates.keys().find(|v| **v < min || **v > max) {
            return Err(CoreError::UpdateOutOfRange {
                module: self.name.to_string(),
                version,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Declared maximum schema version.
    ///
    /// Falls back to the highest update key when `schema_version` is omitted;
    /// `None` means the module has no updates at all.
    pub fn declared_max(&self) -> Option<i64> {
        self.schema_version
            .or_else(|| self.updates.keys().next_back().copied())
    }
}

/// Discover module definitions in the given directories.
///
/// Directories that do not exist are skipped. YAML files without
/// `kind: module` are ignored.
pub fn discover_modules(module_paths: &[PathBuf]) -> CoreResult<Vec<ModuleDef>> {
    let mut modules = Vec::new();

    for path in module_paths {
        if !path.exists() {
            continue;
        }
        discover_modules_recursive(path, &mut modules)?;
    }

    let mut seen: HashMap<String, &Path> = HashMap::new();
    for module in &modules {
        let name = module.name.to_string();
        if let Some(existing) = seen.get(&name) {
            return Err(CoreError::DuplicateModule {
                name,
                path1: existing.display().to_string(),
                path2: module.path.display().to_string(),
            });
        }
        seen.insert(name, &module.path);
    }

    modules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(modules)
}

/// Minimal YAML header that deserializes only the `kind` field.
#[derive(Deserialize)]
struct YamlKindHeader {
    #[serde(default)]
    kind: Option<ModuleKind>,
}

fn is_module_file(content: &str) -> bool {
    serde_yaml::from_str::<YamlKindHeader>(content)
        .map(|header| header.kind == Some(ModuleKind::Module))
        .unwrap_or(false)
}

fn discover_modules_recursive(dir: &Path, modules: &mut Vec<ModuleDef>) -> CoreResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            discover_modules_recursive(&path, modules)?;
            continue;
        }
        if !path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                continue;
            }
        };
        if !is_module_file(&content) {
            log::debug!("Skipping {} (not a module file)", path.display());
            continue;
        }
        modules.push(ModuleDef::parse(&content, &path)?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "module_test.rs"]
mod tests;
