use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

/// How close a task's due date is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    None,
    DueSoon,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Set iff `completed`.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for [`Store::add_task`](crate::Store::add_task).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

impl Task {
    pub(crate) fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then_some(at);
    }

    pub fn is_consistent(&self) -> bool {
        self.completed == self.completed_at.is_some()
    }

    /// Overdue before `today`, due soon on `today` or the day after.
    pub fn due_status(&self, today: NaiveDate) -> DueStatus {
        let Some(due) = self.due_date else {
            return DueStatus::None;
        };
        match (due - today).num_days() {
            d if d < 0 => DueStatus::Overdue,
            0 | 1 => DueStatus::DueSoon,
            _ => DueStatus::None,
        }
    }

    /// Display order: priority high first, then earliest due date, undated
    /// last, then creation time and id so the order is total.
    pub fn display_order(a: &Task, b: &Task) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}
