//! Stores sharing one snapshot file, as the timer and one-shot commands do.

use std::path::Path;

use studydesk_core::model::SettingKey;
use studydesk_core::{JsonFileSink, NewTask, SessionKind, Store, SystemClock};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn open(path: &Path) -> Store {
    Store::load(Box::new(JsonFileSink::at(path)), Box::new(SystemClock)).unwrap()
}

fn snapshot_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("studydesk.json")
}

// ============================================================================
// Concurrent writers
// ============================================================================

#[test]
fn test_long_running_store_keeps_changes_made_elsewhere() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);

    let mut timer = open(&path);
    let mut command = open(&path);

    command.add_task(NewTask::new("Written while the timer runs")).unwrap();
    timer.append_session(SessionKind::PomodoroCompleted, "Focus session", Some(25));
    // A second save from the stale side must not read the task as deleted.
    timer.append_session(SessionKind::BreakCompleted, "Break", Some(5));

    let reloaded = open(&path);
    assert_eq!(reloaded.tasks().len(), 1);
    assert_eq!(reloaded.tasks()[0].text, "Written while the timer runs");
    let kinds: Vec<_> = reloaded.sessions().iter().map(|s| s.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&SessionKind::TaskAdded));
    assert!(kinds.contains(&SessionKind::PomodoroCompleted));
    assert!(kinds.contains(&SessionKind::BreakCompleted));

    assert!(!timer.has_unsaved_changes());
    assert!(timer.take_save_error().is_none());
}

#[test]
fn test_deletion_elsewhere_survives_a_stale_save() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    let id = {
        let mut seed = open(&path);
        seed.add_task(NewTask::new("Drop me")).unwrap().id.clone()
    };

    let mut timer = open(&path);
    let mut command = open(&path);
    assert!(command.remove_task(&id));
    timer.toggle_setting(SettingKey::DarkMode);

    let reloaded = open(&path);
    assert!(reloaded.tasks().is_empty());
    assert!(reloaded.settings().dark_mode);
}

#[test]
fn test_local_change_wins_on_the_same_record() {
    let dir = TempDir::new().unwrap();
    let path = snapshot_path(&dir);
    let id = {
        let mut seed = open(&path);
        seed.add_task(NewTask::new("Outline")).unwrap().id.clone()
    };

    let mut first = open(&path);
    let mut second = open(&path);
    second
        .update_task(&id, |t| t.text = "Outline, theirs".into())
        .unwrap();
    first
        .update_task(&id, |t| t.text = "Outline, mine".into())
        .unwrap();

    let reloaded = open(&path);
    assert_eq!(reloaded.task(&id).unwrap().text, "Outline, mine");
}
