//! The dashboard event loop.
//!
//! A [`Dashboard`] owns the store, the timer and the tip rotator, and is the
//! only thing that mutates them. User [`Intent`]s and scheduler [`Tick`]s are
//! handled one at a time; every handled input ends with a notification (if
//! any) and a render.
//!
//! ## Usage
//!
//! ```ignore
//! let (scheduler, ticks) = TokioScheduler::channel();
//! let dashboard = Dashboard::new(store, Box::new(scheduler), notifier, renderer);
//! let dashboard = dashboard.run(intents, ticks, shutdown).await;
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{CoreError, EntityKind, Result};
use crate::events::Event;
use crate::model::{NewTask, NoteFile, SettingKey};
use crate::report::Reporter;
use crate::sink::{Notifier, RenderSink, Severity};
use crate::store::{EditToken, Store};
use crate::timer::{
    Scheduler, Tick, TickSource, TimerEngine, TimerKind, TimerState, DEFAULT_BREAK_MIN,
    DEFAULT_FOCUS_MIN,
};
use crate::tips::{TipRotator, TIP_ROTATION_PERIOD};

pub const WELCOME_MESSAGE: &str = "Welcome back! Ready to be productive?";
pub const FAULT_MESSAGE: &str = "An error occurred. Please refresh if issues persist.";

/// A user request to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddTask(NewTask),
    ToggleTask(String),
    RequestEdit(String),
    CommitEdit(EditToken, String),
    DeleteTask(String),
    ClearCompletedTasks,
    ClearAllTasks,
    UploadNotes { tag: String, files: Vec<NoteFile> },
    DeleteNote(String),
    SelectNote(String),
    SearchNotes(String),
    StartTimer,
    PauseTimer,
    ToggleTimer,
    ResetTimer,
    SkipTimer,
    SetDuration(u32),
    /// Focus preset, started immediately.
    QuickPomodoro,
    /// Break preset, started immediately.
    TakeBreak,
    ToggleSetting(SettingKey),
    NextTip,
    ClearHistory,
    Import(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What a [`RenderSink`] gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub store: &'a Store,
    pub timer: &'a TimerState,
    pub tip: &'a str,
}

impl<'a> Frame<'a> {
    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        self.timer.display()
    }

    /// Elapsed share of the countdown in whole percent.
    pub fn progress_percent(&self) -> u32 {
        (self.timer.progress() * 100.0).round() as u32
    }

    pub fn reporter(&self) -> Reporter<'a> {
        Reporter::local(self.store)
    }
}

pub struct Dashboard {
    store: Store,
    timer: TimerEngine,
    tips: TipRotator,
    scheduler: Box<dyn Scheduler>,
    notifier: Box<dyn Notifier>,
    renderer: Box<dyn RenderSink>,
    focus_minutes: u32,
    break_minutes: u32,
    tip_period: Duration,
    exit_on_completion: bool,
}

impl Dashboard {
    pub fn new(
        store: Store,
        scheduler: Box<dyn Scheduler>,
        notifier: Box<dyn Notifier>,
        renderer: Box<dyn RenderSink>,
    ) -> Self {
        Self {
            store,
            timer: TimerEngine::new(),
            tips: TipRotator::new(),
            scheduler,
            notifier,
            renderer,
            focus_minutes: DEFAULT_FOCUS_MIN,
            break_minutes: DEFAULT_BREAK_MIN,
            tip_period: TIP_ROTATION_PERIOD,
            exit_on_completion: false,
        }
    }

    /// Minutes used by [`Intent::QuickPomodoro`] and [`Intent::TakeBreak`].
    pub fn with_presets(mut self, focus_minutes: u32, break_minutes: u32) -> Self {
        self.focus_minutes = focus_minutes;
        self.break_minutes = break_minutes;
        self
    }

    pub fn with_tip_period(mut self, period: Duration) -> Self {
        self.tip_period = period;
        self
    }

    /// Makes the loop return once a countdown completes.
    pub fn with_exit_on_completion(mut self, exit: bool) -> Self {
        self.exit_on_completion = exit;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn tips(&self) -> &TipRotator {
        &self.tips
    }

    /// Starts tip rotation if enabled, greets and renders.
    pub fn boot(&mut self) {
        self.sync_tip_rotation();
        self.notify(WELCOME_MESSAGE, Severity::Success);
        self.render();
    }

    /// Carries out one intent.
    pub fn apply(&mut self, intent: Intent) -> Result<Event> {
        let event = match intent {
            Intent::AddTask(new) => Event::TaskAdded {
                id: self.store.add_task(new)?.id.clone(),
            },
            Intent::ToggleTask(id) => {
                if self.store.toggle_task_completion(&id)? {
                    Event::TaskCompleted { id }
                } else {
                    Event::TaskReopened { id }
                }
            }
            Intent::RequestEdit(task_id) => {
                let token = self.store.request_edit(&task_id)?;
                let current_text = self
                    .store
                    .task(&task_id)
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                Event::EditRequested {
                    token,
                    task_id,
                    current_text,
                }
            }
            Intent::CommitEdit(token, text) => Event::TaskUpdated {
                id: self.store.commit_edit(token, &text)?.id.clone(),
            },
            Intent::DeleteTask(id) => {
                let existed = self.store.remove_task(&id);
                Event::TaskDeleted { id, existed }
            }
            Intent::ClearCompletedTasks => Event::TasksCleared {
                count: self.store.clear_completed_tasks(),
                completed_only: true,
            },
            Intent::ClearAllTasks => Event::TasksCleared {
                count: self.store.clear_all_tasks(),
                completed_only: false,
            },
            Intent::UploadNotes { tag, files } => {
                let added = self.store.add_notes(&tag, files)?;
                Event::NotesUploaded {
                    tag: added.first().map(|n| n.tag.clone()).unwrap_or(tag),
                    count: added.len(),
                }
            }
            Intent::DeleteNote(id) => {
                let existed = self.store.remove_note(&id);
                Event::NoteDeleted { id, existed }
            }
            Intent::SelectNote(id) => {
                let note = self
                    .store
                    .note(&id)
                    .ok_or_else(|| CoreError::not_found(EntityKind::Note, id.as_str()))?;
                Event::NoteSelected {
                    filename: note.filename.clone(),
                    id,
                }
            }
            Intent::SearchNotes(term) => Event::NotesSearched {
                matches: self.store.search_notes(&term).ids(),
            },
            Intent::StartTimer => self.timer.start(&mut self.store, self.scheduler.as_ref())?,
            Intent::PauseTimer => self.timer.pause()?,
            Intent::ToggleTimer => self.timer.toggle(&mut self.store, self.scheduler.as_ref())?,
            Intent::ResetTimer => self.timer.reset(),
            Intent::SkipTimer => self.timer.skip(&mut self.store)?,
            Intent::SetDuration(minutes) => self.timer.set_duration(minutes)?,
            Intent::QuickPomodoro => self.start_preset(self.focus_minutes, TimerKind::Work)?,
            Intent::TakeBreak => self.start_preset(self.break_minutes, TimerKind::Break)?,
            Intent::ToggleSetting(key) => {
                let enabled = self.store.toggle_setting(key);
                if key == SettingKey::AutoRotateTips {
                    self.sync_tip_rotation();
                }
                Event::SettingToggled { key, enabled }
            }
            Intent::NextTip => Event::TipRotated {
                tip: self.tips.rotate().to_string(),
            },
            Intent::ClearHistory => Event::HistoryCleared {
                count: self.store.clear_history(),
            },
            Intent::Import(json) => {
                self.store.import_json(&json)?;
                self.sync_tip_rotation();
                Event::DataImported {
                    notes: self.store.notes().len(),
                    tasks: self.store.tasks().len(),
                    sessions: self.store.sessions().len(),
                }
            }
        };
        Ok(event)
    }

    /// Applies an intent, then notifies and renders.
    pub fn handle(&mut self, intent: Intent) -> Flow {
        debug!(?intent, "handling intent");
        let flow = match self.apply(intent) {
            Ok(event) => self.conclude(&event),
            Err(e) => {
                self.report(&e);
                Flow::Continue
            }
        };
        self.render();
        flow
    }

    /// Routes a scheduler tick. Ticks from cancelled handles are dropped.
    pub fn on_tick(&mut self, tick: Tick) -> Flow {
        let flow = match tick.source {
            TickSource::Timer if self.timer.owns(tick.handle_id) => {
                match self.timer.tick(&mut self.store) {
                    Some(event) => self.conclude(&event),
                    None => Flow::Continue,
                }
            }
            TickSource::Tip if self.tips.owns(tick.handle_id) => {
                self.tips.rotate();
                Flow::Continue
            }
            _ => {
                debug!(?tick, "stale tick ignored");
                return Flow::Continue;
            }
        };
        self.render();
        flow
    }

    /// Runs until `shutdown` fires, an input channel closes, or a
    /// completion ends the loop. Returns the dashboard after teardown.
    pub async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        mut ticks: mpsc::UnboundedReceiver<Tick>,
        shutdown: CancellationToken,
    ) -> Self {
        self.boot();
        info!("dashboard running");

        loop {
            let flow = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                intent = intents.recv() => match intent {
                    Some(intent) => self.handle(intent),
                    None => break,
                },
                tick = ticks.recv() => match tick {
                    Some(tick) => self.on_tick(tick),
                    None => break,
                },
            };
            if flow == Flow::Quit {
                break;
            }
        }

        self.teardown();
        info!("dashboard stopped");
        self
    }

    /// Cancels every periodic callback and retries a failed save.
    pub fn teardown(&mut self) {
        self.timer.shutdown();
        self.tips.stop();
        if let Err(e) = self.store.flush() {
            error!(error = %e, "unsaved changes lost at shutdown");
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_preset(&mut self, minutes: u32, kind: TimerKind) -> Result<Event> {
        self.timer.configure(minutes, kind)?;
        self.timer.start(&mut self.store, self.scheduler.as_ref())
    }

    fn sync_tip_rotation(&mut self) {
        if self.store.settings().auto_rotate_tips {
            self.tips.start(self.scheduler.as_ref(), self.tip_period);
        } else {
            self.tips.stop();
        }
    }

    /// Announces a handled event, unless persisting it failed.
    fn conclude(&mut self, event: &Event) -> Flow {
        match self.store.take_save_error() {
            Some(e) => self.report(&CoreError::Storage(e)),
            None => self.announce(event),
        }
        self.flow_after(event)
    }

    fn flow_after(&self, event: &Event) -> Flow {
        match event {
            Event::TimerCompleted { .. } if self.exit_on_completion => Flow::Quit,
            _ => Flow::Continue,
        }
    }

    fn announce(&mut self, event: &Event) {
        if let Some((message, severity)) = event.notification() {
            self.notify(&message, severity);
        }
    }

    fn report(&mut self, err: &CoreError) {
        if err.is_unexpected() {
            error!(error = %err, "unexpected fault");
            self.notify(FAULT_MESSAGE, Severity::Error);
        } else {
            debug!(error = %err, "intent rejected");
            self.notify(&err.to_string(), err.severity());
        }
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        if self.store.settings().notifications {
            self.notifier.notify(message, severity);
        }
    }

    fn render(&mut self) {
        let frame = Frame {
            store: &self.store,
            timer: self.timer.state(),
            tip: self.tips.current(),
        };
        self.renderer.render(&frame);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::error::StorageError;
    use crate::sink::{MemorySink, NullRenderer, PersistenceSink, RecordingNotifier};
    use crate::store::Snapshot;
    use crate::timer::{ManualScheduler, Phase};

    fn dashboard() -> (Dashboard, RecordingNotifier, ManualScheduler) {
        let notifier = RecordingNotifier::new();
        let scheduler = ManualScheduler::new();
        let dashboard = Dashboard::new(
            Store::in_memory(),
            Box::new(scheduler.clone()),
            Box::new(notifier.clone()),
            Box::new(NullRenderer),
        );
        (dashboard, notifier, scheduler)
    }

    #[test]
    fn boot_greets_and_starts_tips() {
        let (mut dash, notifier, scheduler) = dashboard();
        dash.boot();
        assert_eq!(
            notifier.last(),
            Some((Severity::Success, WELCOME_MESSAGE.to_string()))
        );
        assert_eq!(scheduler.live(TickSource::Tip), 1);
    }

    #[test]
    fn validation_error_becomes_notification() {
        let (mut dash, notifier, _) = dashboard();
        let flow = dash.handle(Intent::AddTask(NewTask::new("  ")));
        assert_eq!(flow, Flow::Continue);
        let (severity, _) = notifier.last().unwrap();
        assert_eq!(severity, Severity::Error);
        assert!(dash.store().tasks().is_empty());
    }

    #[test]
    fn conflict_is_a_warning() {
        let (mut dash, notifier, _) = dashboard();
        dash.handle(Intent::StartTimer);
        dash.handle(Intent::StartTimer);
        assert_eq!(notifier.last().unwrap().0, Severity::Warning);
        assert_eq!(dash.timer().phase(), Phase::Running);
    }

    #[test]
    fn disabling_notifications_silences_notifier() {
        let (mut dash, notifier, _) = dashboard();
        dash.handle(Intent::ToggleSetting(SettingKey::Notifications));
        let before = notifier.messages().len();
        dash.handle(Intent::AddTask(NewTask::new("quiet")));
        assert_eq!(notifier.messages().len(), before);
    }

    #[test]
    fn tip_setting_starts_and_stops_rotation() {
        let (mut dash, _, scheduler) = dashboard();
        dash.boot();
        dash.handle(Intent::ToggleSetting(SettingKey::AutoRotateTips));
        assert_eq!(scheduler.live(TickSource::Tip), 0);
        dash.handle(Intent::ToggleSetting(SettingKey::AutoRotateTips));
        assert_eq!(scheduler.live(TickSource::Tip), 1);
    }

    #[test]
    fn stale_timer_tick_is_ignored() {
        let (mut dash, _, _) = dashboard();
        dash.handle(Intent::StartTimer);
        dash.handle(Intent::ResetTimer);
        let remaining = dash.timer().remaining_secs();
        dash.on_tick(Tick {
            source: TickSource::Timer,
            handle_id: 1,
        });
        assert_eq!(dash.timer().remaining_secs(), remaining);
    }

    #[test]
    fn quick_pomodoro_refused_while_running() {
        let (mut dash, notifier, _) = dashboard();
        dash.handle(Intent::TakeBreak);
        assert_eq!(dash.timer().state().kind, TimerKind::Break);
        assert_eq!(dash.timer().total_secs(), DEFAULT_BREAK_MIN * 60);
        dash.handle(Intent::QuickPomodoro);
        assert_eq!(notifier.last().unwrap().0, Severity::Warning);
        assert_eq!(dash.timer().state().kind, TimerKind::Break);
    }

    #[test]
    fn select_missing_note_is_not_found() {
        let (mut dash, _, _) = dashboard();
        assert!(matches!(
            dash.apply(Intent::SelectNote("x".into())),
            Err(CoreError::NotFound {
                entity: EntityKind::Note,
                ..
            })
        ));
    }

    #[test]
    fn completion_quits_when_asked() {
        let (dash, _, _) = dashboard();
        let mut dash = dash.with_exit_on_completion(true);
        dash.handle(Intent::SetDuration(1));
        dash.handle(Intent::StartTimer);
        let mut flow = Flow::Continue;
        for _ in 0..60 {
            flow = dash.on_tick(Tick {
                source: TickSource::Timer,
                handle_id: 1,
            });
        }
        assert_eq!(flow, Flow::Quit);
        assert_eq!(dash.timer().phase(), Phase::Idle);
    }

    /// Fails every save while `broken` is set.
    #[derive(Clone, Default)]
    struct FlakySink {
        broken: Arc<AtomicBool>,
        inner: MemorySink,
    }

    impl PersistenceSink for FlakySink {
        fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StorageError::WriteFailed {
                    path: "studydesk.json".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.save(snapshot)
        }

        fn load(&mut self) -> Result<Option<Snapshot>, StorageError> {
            self.inner.load()
        }
    }

    fn flaky_dashboard() -> (Dashboard, RecordingNotifier, FlakySink) {
        let sink = FlakySink::default();
        sink.broken.store(true, Ordering::SeqCst);
        let notifier = RecordingNotifier::new();
        let dashboard = Dashboard::new(
            Store::new(Box::new(sink.clone()), Box::new(SystemClock)),
            Box::new(ManualScheduler::new()),
            Box::new(notifier.clone()),
            Box::new(NullRenderer),
        );
        (dashboard, notifier, sink)
    }

    #[test]
    fn storage_fault_reports_generic_message() {
        let (mut dash, notifier, _) = flaky_dashboard();
        let flow = dash.handle(Intent::AddTask(NewTask::new("lost")));
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            notifier.last(),
            Some((Severity::Error, FAULT_MESSAGE.to_string()))
        );
        assert!(!notifier
            .messages()
            .iter()
            .any(|(severity, _)| *severity == Severity::Success));
        assert!(dash.store().has_unsaved_changes());
    }

    #[test]
    fn storage_fault_is_reported_once() {
        let (mut dash, notifier, sink) = flaky_dashboard();
        dash.handle(Intent::AddTask(NewTask::new("lost")));
        sink.broken.store(false, Ordering::SeqCst);
        dash.handle(Intent::AddTask(NewTask::new("kept")));
        assert_eq!(notifier.last().unwrap().0, Severity::Success);
        assert!(!dash.store().has_unsaved_changes());
        assert_eq!(sink.inner.latest().unwrap().tasks.len(), 2);
    }

    #[test]
    fn teardown_retries_failed_save() {
        let (mut dash, _, sink) = flaky_dashboard();
        dash.handle(Intent::AddTask(NewTask::new("pending")));
        assert!(sink.inner.latest().is_none());
        sink.broken.store(false, Ordering::SeqCst);
        dash.teardown();
        assert_eq!(sink.inner.latest().unwrap().tasks[0].text, "pending");
        assert!(!dash.store().has_unsaved_changes());
    }

    #[test]
    fn teardown_cancels_everything() {
        let (mut dash, _, scheduler) = dashboard();
        dash.boot();
        dash.handle(Intent::StartTimer);
        dash.teardown();
        assert_eq!(scheduler.live(TickSource::Timer), 0);
        assert_eq!(scheduler.live(TickSource::Tip), 0);
    }
}
