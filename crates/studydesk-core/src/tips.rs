//! Study tips and their rotation.

use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::timer::{Scheduler, TickHandle, TickSource};

/// Default interval between automatic tip rotations.
pub const TIP_ROTATION_PERIOD: Duration = Duration::from_secs(30);

pub const STUDY_TIPS: [&str; 20] = [
    "Take regular breaks every 25-30 minutes to maintain focus and prevent mental fatigue.",
    "Create a dedicated study space free from distractions to improve concentration.",
    "Set specific, measurable goals for each study session to stay motivated.",
    "Use active recall techniques like flashcards instead of just re-reading notes.",
    "Get adequate sleep - your brain consolidates memories during rest periods.",
    "Exercise regularly to improve cognitive function and reduce stress.",
    "Eat brain-healthy foods like nuts, berries, and fish to enhance memory.",
    "Summarize information in your own words to improve understanding.",
    "Study with friends or join study groups for different perspectives.",
    "Try background music or white noise if it helps you concentrate.",
    "Put your phone in another room to avoid digital distractions.",
    "Study during your peak energy hours when you're most alert.",
    "Use the Pomodoro Technique to break work into manageable chunks.",
    "Reward yourself after completing study goals to stay motivated.",
    "Practice spaced repetition to improve long-term retention.",
    "Teach concepts to others - it reveals gaps in your understanding.",
    "Use visual aids like mind maps and diagrams for complex topics.",
    "Create a consistent study schedule to build productive habits.",
    "Try meditation or deep breathing to reduce study anxiety.",
    "Track your progress to see how far you've come!",
];

pub fn random_tip() -> &'static str {
    STUDY_TIPS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(STUDY_TIPS[0])
}

/// The tip on display, plus the recurring tick that rotates it.
#[derive(Debug)]
pub struct TipRotator {
    current: &'static str,
    handle: Option<TickHandle>,
}

impl Default for TipRotator {
    fn default() -> Self {
        Self::new()
    }
}

impl TipRotator {
    pub fn new() -> Self {
        Self {
            current: random_tip(),
            handle: None,
        }
    }

    pub fn current(&self) -> &'static str {
        self.current
    }

    /// Shows a different random tip and returns it.
    pub fn rotate(&mut self) -> &'static str {
        let others: Vec<&'static str> = STUDY_TIPS
            .iter()
            .copied()
            .filter(|tip| *tip != self.current)
            .collect();
        if let Some(tip) = others.choose(&mut rand::thread_rng()) {
            self.current = *tip;
        }
        self.current
    }

    /// Begins automatic rotation. Does nothing if already rotating.
    pub fn start(&mut self, scheduler: &dyn Scheduler, period: Duration) {
        if self.is_rotating() {
            return;
        }
        self.handle = Some(scheduler.every(TickSource::Tip, period));
        debug!(?period, "tip rotation started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
            debug!("tip rotation stopped");
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_cancelled())
    }

    /// Whether a tick produced by handle `handle_id` belongs to this rotator.
    pub fn owns(&self, handle_id: u64) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.id() == handle_id && !h.is_cancelled())
    }
}
