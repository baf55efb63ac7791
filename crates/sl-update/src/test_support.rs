//! Shared fixtures for the engine tests

use crate::registry::UpdateRegistry;
use crate::runner::UpdateEngine;
use sl_core::ModuleDef;
use sl_db::{Catalog, Database, DuckDbBackend, DuckDbDialect};
use std::path::Path;
use std::sync::Arc;

pub(crate) const COMMENT_MODULE: &str = r#"
kind: module
name: comment
schema_version: 5
updates:
  4:
    - add_column:
        table: comments
        column: thread
        type: VARCHAR
        default: "''"
  5:
    - sql: UPDATE {comments} SET thread = '01/' WHERE thread IS NULL
"#;

pub(crate) const FORUM_MODULE: &str = r#"
kind: module
name: forum
schema_min: 2
updates:
  2:
    - sql: CREATE TABLE {forum} (tid INTEGER)
  3:
    - add_column:
        table: forum
        column: weight
        type: INTEGER
        default: 0
"#;

/// Module files for `comment` (installed 3, max 5) and `forum` (range 2..=3,
/// never installed)
pub(crate) fn modules() -> Vec<ModuleDef> {
    vec![
        ModuleDef::parse(COMMENT_MODULE, Path::new("comment.yml")).unwrap(),
        ModuleDef::parse(FORUM_MODULE, Path::new("forum.yml")).unwrap(),
    ]
}

/// In-memory site with a `comments` table and both modules registered
pub(crate) async fn engine() -> UpdateEngine {
    let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    db.execute_batch("CREATE TABLE comments (cid INTEGER); INSERT INTO comments VALUES (1), (2);")
        .await
        .unwrap();

    let catalog = Catalog::new(db.clone(), "");
    catalog.ensure().await.unwrap();
    catalog.register_module("comment", Some(3)).await.unwrap();
    catalog.register_module("forum", None).await.unwrap();

    UpdateEngine::new(
        db,
        UpdateRegistry::from_modules(&modules()),
        Box::new(DuckDbDialect),
        "",
    )
}
