//! Focus timer state machine.
//!
//! The engine counts down in whole seconds. It does not measure time
//! itself: while running it owns a one-second [`TickHandle`] and the caller
//! feeds the resulting ticks back through [`TimerEngine::tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//! Running --tick to zero / skip--> (complete) --> Idle
//! Paused --skip--> (complete) --> Idle
//! any --reset--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(&mut store, &scheduler)?;
//! // For each tick from the scheduler:
//! engine.tick(&mut store); // Returns Some(Event) when the countdown completes
//! ```

use std::time::Duration;

use tracing::debug;

use super::state::{validate_minutes, Phase, TimerKind, TimerState, DEFAULT_FOCUS_MIN};
use super::ticker::{Scheduler, TickHandle, TickSource};
use crate::error::{Result, StateConflict};
use crate::events::Event;
use crate::model::SessionKind;
use crate::store::Store;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct TimerEngine {
    state: TimerState,
    /// Live only while Running.
    ticker: Option<TickHandle>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    /// An idle 25 minute work timer.
    pub fn new() -> Self {
        Self {
            state: TimerState::idle(DEFAULT_FOCUS_MIN * 60, TimerKind::Work),
            ticker: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.state.total_secs
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn display(&self) -> String {
        self.state.display()
    }

    /// Whether a tick produced by handle `handle_id` belongs to this timer.
    pub fn owns(&self, handle_id: u64) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|t| t.id() == handle_id && !t.is_cancelled())
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Starts from Idle or resumes from Paused.
    pub fn start(&mut self, store: &mut Store, scheduler: &dyn Scheduler) -> Result<Event> {
        let event = match self.state.phase {
            Phase::Running => return Err(StateConflict::AlreadyRunning.into()),
            Phase::Idle => {
                if self.state.kind == TimerKind::Work {
                    let description = format!("{} minutes", self.state.total_minutes());
                    store.append_session(SessionKind::PomodoroStarted, description, None);
                }
                Event::TimerStarted {
                    kind: self.state.kind,
                    duration_secs: self.state.total_secs,
                }
            }
            Phase::Paused => Event::TimerResumed {
                remaining_secs: self.state.remaining_secs,
            },
        };

        self.stop_ticking();
        self.ticker = Some(scheduler.every(TickSource::Timer, TICK_PERIOD));
        self.state.phase = Phase::Running;
        debug!(remaining = self.state.remaining_secs, "timer running");
        Ok(event)
    }

    pub fn pause(&mut self) -> Result<Event> {
        if self.state.phase != Phase::Running {
            return Err(StateConflict::NotRunning.into());
        }
        self.stop_ticking();
        self.state.phase = Phase::Paused;
        debug!(remaining = self.state.remaining_secs, "timer paused");
        Ok(Event::TimerPaused {
            remaining_secs: self.state.remaining_secs,
        })
    }

    /// Starts when idle or paused, pauses when running.
    pub fn toggle(&mut self, store: &mut Store, scheduler: &dyn Scheduler) -> Result<Event> {
        match self.state.phase {
            Phase::Running => self.pause(),
            Phase::Idle | Phase::Paused => self.start(store, scheduler),
        }
    }

    /// Back to Idle with a full countdown. Valid from any phase.
    pub fn reset(&mut self) -> Event {
        self.stop_ticking();
        self.state = TimerState::idle(self.state.total_secs, self.state.kind);
        Event::TimerReset {
            total_secs: self.state.total_secs,
        }
    }

    /// One second elapsed. Ignored unless Running.
    ///
    /// Returns `Some(Event::TimerCompleted)` on the tick that reaches zero.
    pub fn tick(&mut self, store: &mut Store) -> Option<Event> {
        if self.state.phase != Phase::Running {
            return None;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            return Some(self.finish(store, false));
        }
        None
    }

    /// Completes a running countdown now.
    pub fn complete(&mut self, store: &mut Store) -> Result<Event> {
        if self.state.phase != Phase::Running {
            return Err(StateConflict::NotRunning.into());
        }
        Ok(self.finish(store, false))
    }

    /// Forced completion of a running or paused countdown. Any
    /// confirmation happens before this is called.
    pub fn skip(&mut self, store: &mut Store) -> Result<Event> {
        if !self.state.is_active() {
            return Err(StateConflict::NotActive.into());
        }
        Ok(self.finish(store, true))
    }

    pub fn set_duration(&mut self, minutes: u32) -> Result<Event> {
        self.configure(minutes, self.state.kind)
    }

    /// Sets length and kind together. Only allowed while Idle.
    pub fn configure(&mut self, minutes: u32, kind: TimerKind) -> Result<Event> {
        if self.state.is_active() {
            return Err(StateConflict::DurationLocked.into());
        }
        let minutes = validate_minutes(minutes)?;
        self.state = TimerState::idle(minutes * 60, kind);
        Ok(Event::DurationSet { minutes, kind })
    }

    /// Cancels the tick on teardown. Leaves the countdown as it is.
    pub fn shutdown(&mut self) {
        self.stop_ticking();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, store: &mut Store, skipped: bool) -> Event {
        let kind = self.state.kind;
        let duration_min = self.state.total_minutes();
        let (session_kind, description) = match kind {
            TimerKind::Work => (
                SessionKind::PomodoroCompleted,
                format!("{duration_min}-minute focus session"),
            ),
            TimerKind::Break => (
                SessionKind::BreakCompleted,
                format!("{duration_min}-minute break"),
            ),
        };
        store.append_session(session_kind, description, Some(duration_min));
        self.reset();
        debug!(?kind, duration_min, skipped, "timer completed");
        Event::TimerCompleted {
            kind,
            duration_min,
            skipped,
        }
    }

    fn stop_ticking(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}
