use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The history log keeps only this many most recent entries.
pub const SESSION_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    PomodoroStarted,
    PomodoroCompleted,
    BreakCompleted,
    TaskAdded,
    TaskCompleted,
}

impl SessionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::PomodoroStarted => "Pomodoro Started",
            SessionKind::PomodoroCompleted => "Pomodoro Completed",
            SessionKind::BreakCompleted => "Break Completed",
            SessionKind::TaskAdded => "Task Added",
            SessionKind::TaskCompleted => "Task Completed",
        }
    }
}

/// One entry of the append-only history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Minutes, only on completed timer cycles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionKind::PomodoroCompleted).unwrap(),
            "\"pomodoro_completed\""
        );
        assert_eq!(SessionKind::TaskAdded.label(), "Task Added");
    }

    #[test]
    fn duration_omitted_when_absent() {
        let session = Session {
            id: "s1".into(),
            kind: SessionKind::TaskAdded,
            description: "Read ch.3".into(),
            timestamp: Utc::now(),
            duration: None,
        };
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("duration").is_none());
    }
}
