use super::*;

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("animeko-session-{}", uuid::Uuid::new_v4()))
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

#[test]
fn memory_round_trip() {
    let store = MemoryTokenStore::new();
    assert!(store.load().unwrap().is_none());
    store.save("tok-1").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-1"));
    store.save("tok-2").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-2"));
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn memory_clear_empty_slot_is_ok() {
    let store = MemoryTokenStore::new();
    store.clear().unwrap();
}

// =============================================================================
// FileTokenStore
// =============================================================================

#[test]
fn file_round_trip() {
    let path = temp_path().join("token");
    let store = FileTokenStore::new(path.clone());
    assert!(store.load().unwrap().is_none());
    store.save("tok-abc").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-abc"));
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_save_creates_parent_dirs() {
    let dir = temp_path();
    let store = FileTokenStore::new(dir.join("nested").join("token"));
    store.save("tok").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn file_whitespace_only_reads_as_absent() {
    let path = temp_path();
    std::fs::write(&path, "\n  \n").unwrap();
    let store = FileTokenStore::new(path.clone());
    assert!(store.load().unwrap().is_none());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn file_load_trims_trailing_newline() {
    let path = temp_path();
    std::fs::write(&path, "tok-xyz\n").unwrap();
    let store = FileTokenStore::new(path.clone());
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-xyz"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn file_clear_missing_file_is_ok() {
    let store = FileTokenStore::new(temp_path());
    store.clear().unwrap();
}
