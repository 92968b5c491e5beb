use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest allowed countdown, in minutes.
pub const MIN_DURATION_MIN: u32 = 1;
/// Longest allowed countdown, in minutes.
pub const MAX_DURATION_MIN: u32 = 120;
/// A standard pomodoro.
pub const DEFAULT_FOCUS_MIN: u32 = 25;
pub const DEFAULT_BREAK_MIN: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    #[default]
    Work,
    Break,
}

/// Countdown state. `total_secs` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub kind: TimerKind,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle(DEFAULT_FOCUS_MIN * 60, TimerKind::Work)
    }
}

impl TimerState {
    pub(crate) fn idle(total_secs: u32, kind: TimerKind) -> Self {
        Self {
            phase: Phase::Idle,
            remaining_secs: total_secs,
            total_secs,
            kind,
        }
    }

    pub fn total_minutes(&self) -> u32 {
        self.total_secs / 60
    }

    /// Fraction of the countdown elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        let elapsed = self.total_secs.saturating_sub(self.remaining_secs);
        (f64::from(elapsed) / f64::from(self.total_secs)).clamp(0.0, 1.0)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs)
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }
}

/// Zero-padded `MM:SS`; minutes are not wrapped into hours.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Checks a requested countdown length.
pub fn validate_minutes(minutes: u32) -> Result<u32, ValidationError> {
    if (MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::DurationOutOfRange {
            got: minutes,
            min: MIN_DURATION_MIN,
            max: MAX_DURATION_MIN,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format_pads() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(120 * 60), "120:00");
    }

    #[test]
    fn progress_bounds() {
        let mut state = TimerState::idle(100, TimerKind::Work);
        assert_eq!(state.progress(), 0.0);
        state.remaining_secs = 25;
        assert!((state.progress() - 0.75).abs() < f64::EPSILON);
        state.remaining_secs = 0;
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn minutes_range() {
        assert!(validate_minutes(0).is_err());
        assert_eq!(validate_minutes(1), Ok(1));
        assert_eq!(validate_minutes(120), Ok(120));
        assert!(validate_minutes(121).is_err());
    }
}
