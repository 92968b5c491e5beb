//! In-memory store for notes, tasks, session history and settings.
//!
//! The store is the single owner of every entity. Each mutating call
//! hands a fresh [`Snapshot`] to the persistence sink before returning.
//! A failing sink does not fail the mutation: the error is kept for the
//! caller to collect with [`Store::take_save_error`] and the store stays
//! dirty until a later save succeeds.

mod search;
mod snapshot;

pub use search::NoteSearch;
pub use snapshot::{parse_import, ExportDocument, Snapshot, EXPORT_VERSION};

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, EntityKind, Result, StorageError, ValidationError};
use crate::model::{
    new_id, NewTask, Note, NoteFile, Record, Session, SessionKind, SettingKey, Settings, Task,
};
use crate::sink::{MemorySink, PersistenceSink};
use snapshot::cap_sessions;

/// Ticket for a pending task edit, see [`Store::request_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditToken(u64);

impl fmt::Display for EditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edit-{}", self.0)
    }
}

pub struct Store {
    notes: Vec<Note>,
    tasks: Vec<Task>,
    sessions: Vec<Session>,
    settings: Settings,
    pending_edits: HashMap<EditToken, String>,
    next_edit: u64,
    clock: Box<dyn Clock>,
    sink: Box<dyn PersistenceSink>,
    unsaved: bool,
    save_error: Option<StorageError>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("notes", &self.notes.len())
            .field("tasks", &self.tasks.len())
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// An empty store. Nothing is read from `sink`.
    pub fn new(sink: Box<dyn PersistenceSink>, clock: Box<dyn Clock>) -> Self {
        Self {
            notes: Vec::new(),
            tasks: Vec::new(),
            sessions: Vec::new(),
            settings: Settings::default(),
            pending_edits: HashMap::new(),
            next_edit: 0,
            clock,
            sink,
            unsaved: false,
            save_error: None,
        }
    }

    /// An empty store backed by a [`MemorySink`] and the system clock.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySink::new()), Box::new(SystemClock))
    }

    /// Builds a store from whatever `sink` last saved, or empty.
    ///
    /// # Errors
    /// Returns an error if the sink cannot produce a snapshot.
    pub fn load(mut sink: Box<dyn PersistenceSink>, clock: Box<dyn Clock>) -> Result<Self> {
        let snapshot = sink.load()?;
        let mut store = Self::new(sink, clock);
        if let Some(snapshot) = snapshot {
            store.apply(snapshot.normalized());
        }
        debug!(?store, "store loaded");
        Ok(store)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            notes: self.notes.clone(),
            tasks: self.tasks.clone(),
            sessions: self.sessions.clone(),
            settings: self.settings,
        }
    }

    /// Hands the current snapshot to the persistence sink.
    ///
    /// A failure is logged and kept for [`Store::take_save_error`].
    pub fn save(&mut self) {
        if let Err(e) = self.try_save() {
            warn!(error = %e, "failed to persist snapshot");
            self.save_error = Some(e);
        }
    }

    fn try_save(&mut self) -> Result<(), StorageError> {
        let snapshot = self.snapshot();
        self.unsaved = true;
        self.sink.save(&snapshot)?;
        self.unsaved = false;
        Ok(())
    }

    /// The error from the most recent failed save, if not yet collected.
    pub fn take_save_error(&mut self) -> Option<StorageError> {
        self.save_error.take()
    }

    /// True when the last save failed and nothing has been saved since.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Saves again only if an earlier save failed.
    ///
    /// # Errors
    /// Returns the sink error if the retry fails too.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.unsaved {
            return Ok(());
        }
        self.save_error = None;
        self.try_save()
    }

    fn apply(&mut self, snapshot: Snapshot) {
        self.notes = snapshot.notes;
        self.tasks = snapshot.tasks;
        self.sessions = snapshot.sessions;
        self.settings = snapshot.settings;
        self.pending_edits.clear();
    }

    // ── Notes ────────────────────────────────────────────────────────

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Files an upload batch under `tag`. Returns the new notes.
    pub fn add_notes(&mut self, tag: &str, files: Vec<NoteFile>) -> Result<&[Note]> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::EmptyTag.into());
        }
        if files.is_empty() {
            return Err(ValidationError::NoFiles.into());
        }

        let now = self.now();
        let first = self.notes.len();
        self.notes.extend(files.into_iter().map(|file| Note {
            id: new_id(),
            tag: tag.to_string(),
            filename: file.filename,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            uploaded_at: now,
        }));
        self.save();
        Ok(&self.notes[first..])
    }

    /// Idempotent: returns whether a note was removed.
    pub fn remove_note(&mut self, id: &str) -> bool {
        let removed = remove_by_id(&mut self.notes, id);
        if removed {
            self.save();
        }
        removed
    }

    /// Case-insensitive substring search over tag and filename.
    pub fn search_notes(&self, term: &str) -> NoteSearch<'_> {
        NoteSearch::run(&self.notes, term)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks in display order, see [`Task::display_order`].
    pub fn sorted_tasks(&self) -> Vec<&Task> {
        let mut sorted: Vec<&Task> = self.tasks.iter().collect();
        sorted.sort_by(|a, b| Task::display_order(a, b));
        sorted
    }

    /// Adds a task and logs it in the history. Returns the new task.
    pub fn add_task(&mut self, new: NewTask) -> Result<&Task> {
        let text = new.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTaskText.into());
        }

        let task = Task {
            id: new_id(),
            text: text.to_string(),
            completed: false,
            priority: new.priority,
            due_date: new.due_date,
            created_at: self.now(),
            completed_at: None,
        };
        let description = task.text.clone();
        self.tasks.push(task);
        self.append_session(SessionKind::TaskAdded, description, None);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Idempotent: returns whether a task was removed.
    pub fn remove_task(&mut self, id: &str) -> bool {
        let removed = remove_by_id(&mut self.tasks, id);
        if removed {
            self.pending_edits.retain(|_, task_id| task_id.as_str() != id);
            self.save();
        }
        removed
    }

    /// Applies `mutator` to the task with `id`.
    ///
    /// `completed_at` is brought back in line with `completed` afterwards.
    pub fn update_task(&mut self, id: &str, mutator: impl FnOnce(&mut Task)) -> Result<()> {
        let now = self.now();
        let task = find_mut(&mut self.tasks, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, id))?;
        mutator(task);
        if task.completed != task.completed_at.is_some() {
            task.set_completed(task.completed, now);
        }
        self.save();
        Ok(())
    }

    /// Flips completion. Returns the new `completed` value.
    pub fn toggle_task_completion(&mut self, id: &str) -> Result<bool> {
        let now = self.now();
        let task = find_mut(&mut self.tasks, id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, id))?;
        let completed = !task.completed;
        task.set_completed(completed, now);
        let text = task.text.clone();

        if completed {
            self.append_session(SessionKind::TaskCompleted, text, None);
        } else {
            self.save();
        }
        Ok(completed)
    }

    /// Opens an edit on a task; finish it with [`Store::commit_edit`].
    pub fn request_edit(&mut self, id: &str) -> Result<EditToken> {
        if self.task(id).is_none() {
            return Err(CoreError::not_found(EntityKind::Task, id));
        }
        self.next_edit += 1;
        let token = EditToken(self.next_edit);
        self.pending_edits.insert(token, id.to_string());
        Ok(token)
    }

    /// Replaces the task text. A token can be committed once.
    ///
    /// Blank text is rejected and leaves the edit pending.
    pub fn commit_edit(&mut self, token: EditToken, text: &str) -> Result<&Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTaskText.into());
        }
        let id = self
            .pending_edits
            .remove(&token)
            .ok_or_else(|| CoreError::not_found(EntityKind::EditToken, token.to_string()))?;
        let task = find_mut(&mut self.tasks, &id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, id.as_str()))?;
        task.text = text.to_string();
        self.save();
        self.task(&id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, id.as_str()))
    }

    pub fn clear_completed_tasks(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let cleared = before - self.tasks.len();
        if cleared > 0 {
            self.forget_stale_edits();
            self.save();
        }
        cleared
    }

    pub fn clear_all_tasks(&mut self) -> usize {
        let cleared = self.tasks.len();
        if cleared > 0 {
            self.tasks.clear();
            self.pending_edits.clear();
            self.save();
        }
        cleared
    }

    fn forget_stale_edits(&mut self) {
        let tasks = &self.tasks;
        self.pending_edits
            .retain(|_, id| tasks.iter().any(|t| t.id == *id));
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// History, oldest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The `n` most recent history entries, newest first.
    pub fn recent_sessions(&self, n: usize) -> impl Iterator<Item = &Session> {
        self.sessions.iter().rev().take(n)
    }

    /// Appends to the history, evicting the oldest entries past the cap.
    pub fn append_session(
        &mut self,
        kind: SessionKind,
        description: impl Into<String>,
        duration: Option<u32>,
    ) -> &Session {
        self.sessions.push(Session {
            id: new_id(),
            kind,
            description: description.into(),
            timestamp: self.now(),
            duration,
        });
        cap_sessions(&mut self.sessions);
        self.save();
        &self.sessions[self.sessions.len() - 1]
    }

    /// Drops all history. Returns how many entries were removed.
    pub fn clear_history(&mut self) -> usize {
        let cleared = self.sessions.len();
        self.sessions.clear();
        self.save();
        cleared
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Flips a setting. Returns the new value.
    pub fn toggle_setting(&mut self, key: SettingKey) -> bool {
        let slot = self.settings.slot(key);
        *slot = !*slot;
        let value = *slot;
        self.save();
        value
    }

    pub fn set_setting(&mut self, key: SettingKey, value: bool) {
        *self.settings.slot(key) = value;
        self.save();
    }

    // ── Import / export ──────────────────────────────────────────────

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.snapshot(), self.now())
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_document())?)
    }

    /// Replaces the store contents with a backup document.
    ///
    /// The store is untouched when the document is rejected.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let snapshot = parse_import(json, self.settings)?;
        self.apply(snapshot);
        self.save();
        debug!(store = ?self, "store replaced from import");
        Ok(())
    }
}

fn remove_by_id<T: Record>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

fn find_mut<'a, T: Record>(items: &'a mut [T], id: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.id() == id)
}
