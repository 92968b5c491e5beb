//! Aggregates derived from the store
//!
//! Everything here is recomputed on demand from the current store contents.
//! Calendar days are evaluated in the reporter's time zone, which is the
//! local zone unless another one is supplied.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Session, SessionKind};
use crate::store::Store;

/// Minutes credited to each completed task in the activity distribution.
pub const MINUTES_PER_TASK: u32 = 15;

/// Share of focus time counted as break time, in percent.
pub const BREAK_SHARE_PERCENT: u32 = 20;

/// One day of the weekly series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Short weekday label, e.g. `Mon`
    pub weekday: String,
    /// Minutes of completed focus sessions on this day
    pub focus_minutes: u32,
    /// Tasks whose completion falls on this day
    pub completed_tasks: usize,
}

/// Whole-store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_notes: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Percentage of completed tasks, rounded (0 without tasks)
    pub completion_rate: u32,
    /// Number of completed focus sessions
    pub total_pomodoros: usize,
    pub total_focus_minutes: u32,
    /// Rounded mean focus session length (0 without sessions)
    pub average_session_minutes: u32,
}

impl Statistics {
    /// Total focus time as `Hh Mm`.
    pub fn focus_time_display(&self) -> String {
        format!(
            "{}h {}m",
            self.total_focus_minutes / 60,
            self.total_focus_minutes % 60
        )
    }
}

/// Estimated minutes spent per activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDistribution {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub task_minutes: u32,
}

/// A history entry as written by the progress export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Session> for ProgressEntry {
    fn from(session: &Session) -> Self {
        Self {
            kind: session.kind,
            description: session.description.clone(),
            timestamp: session.timestamp,
        }
    }
}

/// Read-only view over a store that computes reports.
#[derive(Debug, Clone)]
pub struct Reporter<'a, Tz: TimeZone = Local> {
    store: &'a Store,
    tz: Tz,
}

impl<'a> Reporter<'a, Local> {
    /// Reporter using the local time zone.
    pub fn local(store: &'a Store) -> Self {
        Self::new(store, Local)
    }
}

impl<'a, Tz: TimeZone> Reporter<'a, Tz> {
    pub fn new(store: &'a Store, tz: Tz) -> Self {
        Self { store, tz }
    }

    fn day_of(&self, ts: &DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }

    /// The current calendar day according to the store clock.
    pub fn today(&self) -> NaiveDate {
        self.day_of(&self.store.now())
    }

    fn completed_focus(&self) -> impl Iterator<Item = &'a Session> {
        self.store
            .sessions()
            .iter()
            .filter(|s| s.kind == SessionKind::PomodoroCompleted)
    }

    /// Sum of completed focus minutes on `date`.
    pub fn daily_focus_minutes(&self, date: NaiveDate) -> u32 {
        self.completed_focus()
            .filter(|s| self.day_of(&s.timestamp) == date)
            .filter_map(|s| s.duration)
            .sum()
    }

    /// Number of tasks completed on `date`.
    pub fn daily_completed_tasks(&self, date: NaiveDate) -> usize {
        self.store
            .tasks()
            .iter()
            .filter_map(|t| t.completed_at.as_ref())
            .filter(|at| self.day_of(at) == date)
            .count()
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DailySummary {
        DailySummary {
            date,
            weekday: date.format("%a").to_string(),
            focus_minutes: self.daily_focus_minutes(date),
            completed_tasks: self.daily_completed_tasks(date),
        }
    }

    /// The last seven days, oldest first, ending today.
    ///
    /// The iterator is lazy; cloning it restarts from the first day.
    pub fn weekly_series(&self) -> WeeklySeries<'a, Tz> {
        let end = self.today();
        WeeklySeries {
            reporter: self.clone(),
            next: Some(end - Duration::days(6)),
            end,
        }
    }

    pub fn statistics(&self) -> Statistics {
        let tasks = self.store.tasks();
        let total_tasks = tasks.len();
        let completed_tasks = tasks.iter().filter(|t| t.completed).count();
        let total_pomodoros = self.completed_focus().count();
        let total_focus_minutes: u32 = self.completed_focus().filter_map(|s| s.duration).sum();

        Statistics {
            total_notes: self.store.notes().len(),
            total_tasks,
            completed_tasks,
            completion_rate: rounded_ratio(completed_tasks as f64 * 100.0, total_tasks),
            total_pomodoros,
            total_focus_minutes,
            average_session_minutes: rounded_ratio(total_focus_minutes as f64, total_pomodoros),
        }
    }

    pub fn activity_distribution(&self) -> ActivityDistribution {
        let focus_minutes: u32 = self.completed_focus().filter_map(|s| s.duration).sum();
        let completed = self.store.tasks().iter().filter(|t| t.completed).count() as u32;
        ActivityDistribution {
            focus_minutes,
            break_minutes: focus_minutes * BREAK_SHARE_PERCENT / 100,
            task_minutes: completed * MINUTES_PER_TASK,
        }
    }

    /// The session history in export form, oldest first.
    pub fn progress_log(&self) -> Vec<ProgressEntry> {
        self.store.sessions().iter().map(ProgressEntry::from).collect()
    }

    /// Plain-text session summary.
    pub fn summary_text(&self) -> String {
        let now = self.store.now();
        let sessions = self.store.sessions();
        let total: u32 = sessions.iter().filter_map(|s| s.duration).sum();

        let mut out = String::from("Session Summary\n");
        out.push_str(&format!("Total Focus Time: {total} minutes\n"));
        for s in sessions {
            out.push_str(&format!(
                "- {}: {} ({})\n",
                s.kind.label(),
                s.description,
                relative_time(s.timestamp, now)
            ));
        }
        out
    }
}

/// Lazy seven-day series, see [`Reporter::weekly_series`].
#[derive(Debug, Clone)]
pub struct WeeklySeries<'a, Tz: TimeZone = Local> {
    reporter: Reporter<'a, Tz>,
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl<Tz: TimeZone> Iterator for WeeklySeries<'_, Tz> {
    type Item = DailySummary;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.next.filter(|d| *d <= self.end)?;
        self.next = date.succ_opt();
        Some(self.reporter.daily_summary(date))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self
            .next
            .map(|d| (self.end - d).num_days() + 1)
            .unwrap_or(0)
            .max(0) as usize;
        (left, Some(left))
    }
}

impl<Tz: TimeZone> ExactSizeIterator for WeeklySeries<'_, Tz> {}

fn rounded_ratio(numerator: f64, denominator: usize) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator / denominator as f64).round() as u32
}

/// Short age of a timestamp: `Just now`, `12m ago`, `3h ago`, else the date.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - ts).num_minutes();
    match minutes {
        m if m < 1 => "Just now".to_string(),
        m if m < 60 => format!("{m}m ago"),
        m if m < 24 * 60 => format!("{}h ago", m / 60),
        _ => ts.format("%Y-%m-%d").to_string(),
    }
}

/// Day label relative to `today`: `Today`, `Yesterday`, `3 days ago`, else
/// the date.
pub fn relative_day(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days().abs() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{d} days ago"),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
