use super::*;
use tempfile::tempdir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: site").unwrap();
    assert_eq!(config.name, "site");
    assert_eq!(config.module_paths, vec!["modules".to_string()]);
    assert!(config.access_check);
    assert_eq!(config.slice_budget_ms, 1000);
    assert_eq!(config.database.dialect, DatabaseDialect::DuckDb);
    assert_eq!(config.database.table_prefix, "");
    assert_eq!(config.session_dir, "target/sessions");
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: legacy_site
module_paths:
  - modules
  - contrib
database:
  path: ./site.duckdb
  dialect: postgres
  table_prefix: cms_
access_check: false
admin_token: s3cret
slice_budget_ms: 250
session_dir: var/sessions
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.module_paths.len(), 2);
    assert_eq!(config.database.dialect, DatabaseDialect::Postgres);
    assert_eq!(config.database.table_prefix, "cms_");
    assert!(!config.access_check);
    assert_eq!(config.slice_budget_ms, 250);
    assert!(config.is_admin_token("s3cret"));
    assert!(!config.is_admin_token("guess"));
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("name: site\nbogus: 1");
    assert!(result.is_err());
}

#[test]
fn test_empty_admin_token_never_matches() {
    let config: Config = serde_yaml::from_str("name: site\nadmin_token: ''").unwrap();
    assert!(!config.is_admin_token(""));
}

#[test]
fn test_dialect_from_str_aliases() {
    assert_eq!("pgsql".parse::<DatabaseDialect>().unwrap(), DatabaseDialect::Postgres);
    assert_eq!("mysqli".parse::<DatabaseDialect>().unwrap(), DatabaseDialect::MySql);
    assert_eq!("DuckDB".parse::<DatabaseDialect>().unwrap(), DatabaseDialect::DuckDb);
    assert!("oracle".parse::<DatabaseDialect>().is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("sluice.yml"), "name: from_dir\n").unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "from_dir");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_invalid_table_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sluice.yml");
    std::fs::write(&path, "name: x\ndatabase:\n  table_prefix: \"drop table;\"\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_database_path_absolute() {
    let root = std::path::PathBuf::from("/srv/site");
    let mut config: Config = serde_yaml::from_str("name: x").unwrap();
    assert_eq!(
        config.database_path_absolute(&root),
        root.join("sluice.duckdb").display().to_string()
    );

    config.database.path = ":memory:".to_string();
    assert_eq!(config.database_path_absolute(&root), ":memory:");
}
