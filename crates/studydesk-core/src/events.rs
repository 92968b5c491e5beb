use serde::{Deserialize, Serialize};

use crate::model::SettingKey;
use crate::sink::Severity;
use crate::store::EditToken;
use crate::timer::TimerKind;

/// Every handled intent produces an Event.
/// The dashboard turns it into a notification and a re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        kind: TimerKind,
        duration_secs: u32,
    },
    TimerResumed {
        remaining_secs: u32,
    },
    TimerPaused {
        remaining_secs: u32,
    },
    TimerReset {
        total_secs: u32,
    },
    TimerCompleted {
        kind: TimerKind,
        duration_min: u32,
        /// Forced by the user rather than counted down.
        skipped: bool,
    },
    DurationSet {
        minutes: u32,
        kind: TimerKind,
    },
    TaskAdded {
        id: String,
    },
    TaskCompleted {
        id: String,
    },
    TaskReopened {
        id: String,
    },
    EditRequested {
        token: EditToken,
        task_id: String,
        current_text: String,
    },
    TaskUpdated {
        id: String,
    },
    TaskDeleted {
        id: String,
        existed: bool,
    },
    TasksCleared {
        count: usize,
        completed_only: bool,
    },
    NotesUploaded {
        tag: String,
        count: usize,
    },
    NoteDeleted {
        id: String,
        existed: bool,
    },
    NoteSelected {
        id: String,
        filename: String,
    },
    NotesSearched {
        /// `None` when the search term was blank.
        matches: Option<Vec<String>>,
    },
    HistoryCleared {
        count: usize,
    },
    SettingToggled {
        #[serde(with = "setting_key")]
        key: SettingKey,
        enabled: bool,
    },
    TipRotated {
        tip: String,
    },
    DataImported {
        notes: usize,
        tasks: usize,
        sessions: usize,
    },
}

impl Event {
    /// Notification shown to the user for this event, if any.
    pub fn notification(&self) -> Option<(String, Severity)> {
        let note = match self {
            Event::TimerCompleted { skipped: true, .. } => {
                ("Timer skipped!".to_string(), Severity::Warning)
            }
            Event::TimerCompleted {
                kind: TimerKind::Work,
                ..
            } => (
                "Pomodoro completed! Great job!".to_string(),
                Severity::Success,
            ),
            Event::TimerCompleted {
                kind: TimerKind::Break,
                ..
            } => ("Break is over. Back to it!".to_string(), Severity::Info),
            Event::DurationSet { minutes, .. } => {
                (format!("Timer set to {minutes} minutes"), Severity::Info)
            }
            Event::TaskAdded { .. } => ("New task added!".to_string(), Severity::Success),
            Event::TaskCompleted { .. } => ("Task completed!".to_string(), Severity::Success),
            Event::TaskUpdated { .. } => ("Task updated!".to_string(), Severity::Success),
            Event::TaskDeleted { existed: true, .. } => {
                ("Task deleted!".to_string(), Severity::Success)
            }
            Event::TasksCleared {
                count: 0,
                completed_only: true,
            } => (
                "No completed tasks to clear.".to_string(),
                Severity::Warning,
            ),
            Event::TasksCleared { count: 0, .. } => {
                ("No tasks to clear.".to_string(), Severity::Warning)
            }
            Event::TasksCleared {
                count,
                completed_only: true,
            } => (
                format!("{count} completed tasks cleared!"),
                Severity::Success,
            ),
            Event::TasksCleared { .. } => ("All tasks cleared!".to_string(), Severity::Success),
            Event::NotesUploaded { count, .. } => (
                format!("{count} notes uploaded successfully!"),
                Severity::Success,
            ),
            Event::NoteDeleted { existed: true, .. } => {
                ("Note deleted successfully!".to_string(), Severity::Success)
            }
            Event::NoteSelected { filename, .. } => {
                (format!("Selected: {filename}"), Severity::Info)
            }
            Event::HistoryCleared { .. } => ("Progress reset!".to_string(), Severity::Warning),
            Event::SettingToggled { key, enabled } => {
                (key.toggled_message(*enabled), Severity::Info)
            }
            Event::TipRotated { .. } => ("Here's a fresh tip!".to_string(), Severity::Info),
            Event::DataImported { .. } => {
                ("Data imported successfully!".to_string(), Severity::Success)
            }
            _ => return None,
        };
        Some(note)
    }
}

mod setting_key {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::model::SettingKey;

    pub fn serialize<S: Serializer>(key: &SettingKey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(key.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SettingKey, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
