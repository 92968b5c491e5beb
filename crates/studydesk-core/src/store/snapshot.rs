//! Snapshot, export and import documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{
    Note, Record, Session, SettingKey, Settings, SettingsPatch, Task, SESSION_HISTORY_CAP,
};

/// Version written into export documents.
pub const EXPORT_VERSION: &str = "1.0";

/// The full serializable state of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub settings: Settings,
}

impl Snapshot {
    /// Drops history beyond the session cap.
    pub(crate) fn normalized(mut self) -> Self {
        cap_sessions(&mut self.sessions);
        self
    }

    /// Three-way merge of two snapshots that both descend from `base`.
    ///
    /// `self` is the local side and wins where both sides changed the same
    /// record or setting. Records the other side added, changed or deleted
    /// without a local change follow the other side.
    pub fn merge(&self, base: &Snapshot, theirs: &Snapshot) -> Snapshot {
        let mut sessions = merge_records(&base.sessions, &self.sessions, &theirs.sessions);
        sessions.sort_by_key(|s| s.timestamp);

        let mut settings = self.settings;
        for key in SettingKey::ALL {
            if self.settings.get(key) == base.settings.get(key) {
                *settings.slot(key) = theirs.settings.get(key);
            }
        }

        Snapshot {
            notes: merge_records(&base.notes, &self.notes, &theirs.notes),
            tasks: merge_records(&base.tasks, &self.tasks, &theirs.tasks),
            sessions,
            settings,
        }
        .normalized()
    }
}

fn find<'a, T: Record>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

fn merge_records<T: Record + Clone + PartialEq>(base: &[T], ours: &[T], theirs: &[T]) -> Vec<T> {
    let mut merged = Vec::with_capacity(ours.len());
    for item in ours {
        let id = item.id();
        match (find(base, id), find(theirs, id)) {
            // Deleted on the other side and untouched here.
            (Some(old), None) if old == item => {}
            // Changed on the other side only.
            (Some(old), Some(other)) if old == item => merged.push(other.clone()),
            _ => merged.push(item.clone()),
        }
    }
    merged.extend(
        theirs
            .iter()
            .filter(|t| find(base, t.id()).is_none() && find(ours, t.id()).is_none())
            .cloned(),
    );
    merged
}

/// A backup document as written by export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportDocument {
    pub fn new(snapshot: Snapshot, export_date: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            export_date,
            version: EXPORT_VERSION.to_string(),
        }
    }
}

/// A backup document as read by import. Everything is optional here so
/// that missing fields become validation errors rather than parse errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    version: Option<serde_json::Value>,
    export_date: Option<serde_json::Value>,
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    settings: SettingsPatch,
}

/// Parses and validates a backup document against the current settings.
///
/// Collections are replaced wholesale; settings are merged key by key.
pub fn parse_import(json: &str, current: Settings) -> Result<Snapshot, ValidationError> {
    let doc: ImportDocument = serde_json::from_str(json)
        .map_err(|e| ValidationError::MalformedImport(e.to_string()))?;

    if !is_present(doc.version.as_ref()) {
        return Err(ValidationError::MalformedImport("missing version".into()));
    }
    if !is_present(doc.export_date.as_ref()) {
        return Err(ValidationError::MalformedImport("missing exportDate".into()));
    }
    if let Some(task) = doc.tasks.iter().find(|t| !t.is_consistent()) {
        return Err(ValidationError::MalformedImport(format!(
            "task {} has an inconsistent completion timestamp",
            task.id
        )));
    }

    let snapshot = Snapshot {
        notes: doc.notes,
        tasks: doc.tasks,
        sessions: doc.sessions,
        settings: current.merged(doc.settings),
    };
    Ok(snapshot.normalized())
}

fn is_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

/// Keeps the most recent [`SESSION_HISTORY_CAP`] entries, in order.
pub(crate) fn cap_sessions(sessions: &mut Vec<Session>) {
    if sessions.len() > SESSION_HISTORY_CAP {
        let excess = sessions.len() - SESSION_HISTORY_CAP;
        sessions.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_requires_version_and_export_date() {
        let missing_version = r#"{"exportDate": "2026-01-01T00:00:00Z", "tasks": []}"#;
        assert!(matches!(
            parse_import(missing_version, Settings::default()),
            Err(ValidationError::MalformedImport(m)) if m.contains("version")
        ));

        let missing_date = r#"{"version": "1.0"}"#;
        assert!(matches!(
            parse_import(missing_date, Settings::default()),
            Err(ValidationError::MalformedImport(m)) if m.contains("exportDate")
        ));

        let blank = r#"{"version": "", "exportDate": "2026-01-01"}"#;
        assert!(parse_import(blank, Settings::default()).is_err());
    }

    #[test]
    fn import_rejects_garbage() {
        assert!(parse_import("not json", Settings::default()).is_err());
        assert!(parse_import(r#"{"version": "1.0", "exportDate": "x", "tasks": [1]}"#, Settings::default()).is_err());
    }

    #[test]
    fn import_merges_settings() {
        let json = r#"{"version": "1.0", "exportDate": "2026-01-01T00:00:00Z", "settings": {"soundEnabled": false}}"#;
        let current = Settings {
            dark_mode: true,
            ..Settings::default()
        };
        let snapshot = parse_import(json, current).unwrap();
        assert!(!snapshot.settings.sound_enabled);
        assert!(snapshot.settings.dark_mode);
        assert!(snapshot.notes.is_empty());
    }

    fn task(id: &str, text: &str) -> Task {
        Task {
            id: id.into(),
            text: text.into(),
            completed: false,
            priority: Default::default(),
            due_date: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn with_tasks(tasks: Vec<Task>) -> Snapshot {
        Snapshot {
            tasks,
            ..Snapshot::default()
        }
    }

    #[test]
    fn merge_keeps_records_added_on_either_side() {
        let a = task("a", "shared");
        let base = with_tasks(vec![a.clone()]);
        let ours = with_tasks(vec![a.clone(), task("b", "mine")]);
        let theirs = with_tasks(vec![a, task("c", "theirs")]);

        let merged = ours.merge(&base, &theirs);
        let ids: Vec<_> = merged.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn merge_follows_deletions_and_edits_from_the_other_side() {
        let base = with_tasks(vec![task("a", "one"), task("b", "two")]);
        let ours = base.clone();
        let theirs = with_tasks(vec![task("b", "two, edited")]);

        let merged = ours.merge(&base, &theirs);
        assert_eq!(merged.tasks.len(), 1);
        assert_eq!(merged.tasks[0].text, "two, edited");
    }

    #[test]
    fn merge_prefers_local_changes_and_deletions() {
        let base = with_tasks(vec![task("a", "one"), task("b", "two")]);
        let ours = with_tasks(vec![task("a", "one, mine")]);
        let theirs = with_tasks(vec![task("a", "one, theirs"), task("b", "two")]);

        let merged = ours.merge(&base, &theirs);
        assert_eq!(merged.tasks.len(), 1);
        assert_eq!(merged.tasks[0].text, "one, mine");
    }

    #[test]
    fn merge_settings_key_by_key() {
        let base = Snapshot::default();
        let mut ours = Snapshot::default();
        ours.settings.dark_mode = true;
        let mut theirs = Snapshot::default();
        theirs.settings.sound_enabled = false;

        let merged = ours.merge(&base, &theirs);
        assert!(merged.settings.dark_mode);
        assert!(!merged.settings.sound_enabled);
    }

    #[test]
    fn export_document_is_flat() {
        let doc = ExportDocument::new(Snapshot::default(), Utc::now());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["version"], "1.0");
        assert!(json.get("exportDate").is_some());
        assert!(json["notes"].is_array());
        assert!(json.get("snapshot").is_none());
    }
}
