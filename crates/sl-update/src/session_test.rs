use super::*;
use sl_core::{ModuleName, PendingUpdate, QueryResult};
use tempfile::tempdir;

fn sample_state() -> UpdateRunState {
    let comment = ModuleName::new("comment");
    let mut state = UpdateRunState::new(vec![
        PendingUpdate::new(comment.clone(), 4),
        PendingUpdate::new(comment.clone(), 5),
    ]);
    state.pop_next();
    state.record(
        &comment,
        4,
        vec![QueryResult::ok("ALTER TABLE comments ADD COLUMN thread VARCHAR")],
    );
    state
}

fn exercise(store: &dyn SessionStore) {
    assert!(store.load("abc-123").unwrap().is_none());

    let state = sample_state();
    store.save("abc-123", &state).unwrap();

    let loaded = store.load("abc-123").unwrap().unwrap();
    assert_eq!(loaded.run_id, state.run_id);
    assert_eq!(loaded.total, 2);
    assert_eq!(loaded.remaining.len(), 1);
    assert_eq!(loaded.results, state.results);

    // Sessions are independent
    assert!(store.load("other").unwrap().is_none());

    store.clear("abc-123").unwrap();
    assert!(store.load("abc-123").unwrap().is_none());
    store.clear("abc-123").unwrap();
}

#[test]
fn test_memory_store() {
    exercise(&MemorySessionStore::new());
}

#[test]
fn test_file_store() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path().join("sessions"));
    exercise(&store);
}

#[test]
fn test_file_store_writes_json_per_session() {
    let dir = tempdir().unwrap();
    let store = FileSessionStore::new(dir.path());
    store.save("s1", &sample_state()).unwrap();

    let path = dir.path().join("s1.json");
    assert!(path.exists());
    assert!(!dir.path().join("s1.json.tmp").exists());
    let raw = std::fs::read_to_string(path).unwrap();
    assert!(raw.contains("\"remaining\""));
}

#[test]
fn test_invalid_session_ids() {
    assert!(validate_session_id("3f2c9a1e-77b0-4c1d-9a55-0d1f6b2f9e10").is_ok());
    assert!(validate_session_id("").is_err());
    assert!(validate_session_id("../etc/passwd").is_err());
    assert!(validate_session_id("a b").is_err());
    assert!(validate_session_id(&"x".repeat(129)).is_err());

    let store = MemorySessionStore::new();
    let err = store.load("../x").unwrap_err();
    assert!(matches!(err, UpdateError::InvalidSessionId(_)));

    let dir = tempdir().unwrap();
    let err = FileSessionStore::new(dir.path())
        .save("a/b", &sample_state())
        .unwrap_err();
    assert!(err.to_string().contains("[U001]"));
}
