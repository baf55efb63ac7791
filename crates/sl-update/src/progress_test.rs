use super::*;
use crate::registry::{UpdateContext, UpdateRegistry, UpdateRoutine};
use crate::test_support;
use async_trait::async_trait;
use sl_core::QueryResult;
use sl_db::{Catalog, Database, DuckDbBackend, DuckDbDialect};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn starts(entries: &[(&str, i64)]) -> BTreeMap<ModuleName, i64> {
    entries
        .iter()
        .map(|(m, v)| (ModuleName::new(*m), *v))
        .collect()
}

/// A timer whose budget is already spent
fn exhausted_timer() -> RequestTimer {
    let past = Instant::now()
        .checked_sub(Duration::from_secs(5))
        .unwrap_or_else(Instant::now);
    RequestTimer::started_at(past)
}

#[tokio::test]
async fn test_selection_defaults() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let choices = controller.selection().await.unwrap();
    assert_eq!(
        choices,
        vec![
            ModuleChoice {
                module: ModuleName::new("comment"),
                versions: vec![1, 2, 3, 4, 5],
                skip_value: 6,
                default_start: 4,
            },
            ModuleChoice {
                module: ModuleName::new("forum"),
                versions: vec![2, 3],
                skip_value: 4,
                default_start: 2,
            },
        ]
    );
}

#[tokio::test]
async fn test_selection_up_to_date_defaults_to_skip() {
    let engine = test_support::engine().await;
    engine
        .database()
        .execute("UPDATE system SET schema_version = 5 WHERE name = 'comment'")
        .await
        .unwrap();
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let choices = controller.selection().await.unwrap();
    assert_eq!(choices[0].default_start, 6);
    assert_eq!(choices[0].default_start, choices[0].skip_value);
}

#[tokio::test]
async fn test_comment_scenario() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let mut state = controller.confirm(&starts(&[("comment", 4)])).await.unwrap();
    let comment = ModuleName::new("comment");
    assert_eq!(
        state.remaining.iter().cloned().collect::<Vec<_>>(),
        vec![
            PendingUpdate::new(comment.clone(), 4),
            PendingUpdate::new(comment.clone(), 5),
        ]
    );
    assert_eq!(state.total, 2);
    assert_eq!(engine.version_store().installed_version("comment").await.unwrap(), Some(3));

    let progress = controller.poll(&mut state, &RequestTimer::start()).await.unwrap();
    assert_eq!(
        progress,
        Progress {
            percent: 100,
            message: "Updating comment module".to_string(),
        }
    );
    assert_eq!(progress.to_string(), "100|Updating comment module");
    assert!(state.is_finished());
    assert_eq!(state.results[&comment].len(), 2);
    assert!(state.results[&comment].values().flatten().all(|q| q.success));
    assert_eq!(engine.version_store().installed_version("comment").await.unwrap(), Some(5));

    let rows = engine
        .database()
        .query_rows("SELECT thread FROM comments")
        .await
        .unwrap();
    assert!(rows.iter().all(|r| r[0].as_deref() == Some("01/")));
}

#[tokio::test]
async fn test_confirm_sets_installed_to_start_minus_one() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let state = controller
        .confirm(&starts(&[("comment", 2), ("forum", 2)]))
        .await
        .unwrap();
    let queued: Vec<(String, i64)> = state
        .remaining
        .iter()
        .map(|p| (p.module.to_string(), p.version))
        .collect();
    assert_eq!(
        queued,
        vec![
            ("comment".to_string(), 2),
            ("comment".to_string(), 3),
            ("comment".to_string(), 4),
            ("comment".to_string(), 5),
            ("forum".to_string(), 2),
            ("forum".to_string(), 3),
        ]
    );

    let mut store = engine.version_store();
    assert_eq!(store.installed_version("comment").await.unwrap(), Some(1));
    assert_eq!(store.installed_version("forum").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_confirm_skip_option_queues_nothing() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let mut state = controller.confirm(&starts(&[("comment", 6)])).await.unwrap();
    assert_eq!(state.total, 0);
    assert_eq!(engine.version_store().installed_version("comment").await.unwrap(), Some(5));

    let progress = controller.poll(&mut state, &RequestTimer::start()).await.unwrap();
    assert_eq!(progress.percent, 100);
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn test_confirm_ignores_unknown_and_out_of_range() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);

    let state = controller
        .confirm(&starts(&[("ghost", 1), ("forum", 1), ("comment", 9)]))
        .await
        .unwrap();
    assert_eq!(state.total, 0);

    let mut store = engine.version_store();
    assert_eq!(store.installed_version("forum").await.unwrap(), None);
    assert_eq!(store.installed_version("comment").await.unwrap(), Some(3));
}

#[tokio::test]
async fn test_poll_slices_are_bounded() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, Duration::ZERO);
    let mut state = controller
        .confirm(&starts(&[("comment", 4), ("forum", 2)]))
        .await
        .unwrap();
    assert_eq!(state.total, 4);

    let mut seen = Vec::new();
    loop {
        let before = state.remaining.len();
        let progress = controller.poll(&mut state, &exhausted_timer()).await.unwrap();
        // One update per slice once the budget is spent
        assert_eq!(state.remaining.len(), before - 1);
        seen.push(progress.percent);
        if progress.is_complete() {
            break;
        }
    }

    assert_eq!(seen, vec![25, 50, 75, 100]);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(state.results["forum"].len(), 2);
}

#[tokio::test]
async fn test_poll_message_names_last_module() {
    let engine = test_support::engine().await;
    let mut controller = ProgressController::new(&engine, Duration::ZERO);
    let mut state = controller
        .confirm(&starts(&[("comment", 5), ("forum", 3)]))
        .await
        .unwrap();

    let first = controller.poll(&mut state, &exhausted_timer()).await.unwrap();
    assert_eq!(first.to_string(), "50|Updating comment module");
    let second = controller.poll(&mut state, &exhausted_timer()).await.unwrap();
    assert_eq!(second.to_string(), "100|Updating forum module");

    let idle = controller.poll(&mut state, &exhausted_timer()).await.unwrap();
    assert_eq!(idle.to_string(), "100|No pending updates");
}

#[test]
fn test_progress_starting() {
    let progress = Progress::starting();
    assert_eq!(progress.to_string(), "0|Starting updates...");
    assert!(!progress.is_complete());
}

/// Renames the catalog away on its first run so the version write fails
struct CatalogThief {
    runs: AtomicUsize,
}

#[async_trait]
impl UpdateRoutine for CatalogThief {
    async fn run(&self, ctx: &UpdateContext<'_>) -> Vec<QueryResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        vec![ctx.mutator.update_sql("ALTER TABLE {system} RENAME TO system_moved").await]
    }
}

#[tokio::test]
async fn test_failed_version_write_is_not_retried() {
    let db: Arc<dyn Database> = Arc::new(DuckDbBackend::in_memory().unwrap());
    let catalog = Catalog::new(db.clone(), "");
    catalog.ensure().await.unwrap();
    catalog.register_module("comment", Some(3)).await.unwrap();

    let comment = ModuleName::new("comment");
    let routine = Arc::new(CatalogThief {
        runs: AtomicUsize::new(0),
    });
    let mut registry = UpdateRegistry::new();
    registry.register_module(comment.clone(), Some(4), Some(4));
    registry.register_update(&comment, 4, routine.clone());
    let engine = UpdateEngine::new(db.clone(), registry, Box::new(DuckDbDialect), "");

    let mut controller = ProgressController::new(&engine, DEFAULT_SLICE_BUDGET);
    let mut state = controller.confirm(&starts(&[("comment", 4)])).await.unwrap();
    assert!(controller.poll(&mut state, &RequestTimer::start()).await.is_err());

    // The update left the queue with its results even though the write failed
    assert!(state.remaining.is_empty());
    assert_eq!(state.results[&comment][&4].len(), 1);
    assert!(state.results[&comment][&4][0].success);

    db.execute("ALTER TABLE system_moved RENAME TO system")
        .await
        .unwrap();
    let progress = controller.poll(&mut state, &RequestTimer::start()).await.unwrap();
    assert_eq!(progress.to_string(), "100|No pending updates");
    assert_eq!(routine.runs.load(Ordering::SeqCst), 1);
}
