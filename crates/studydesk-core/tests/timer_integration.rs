//! Timer behaviour through the engine and the dashboard loop.

use std::time::Duration;

use proptest::prelude::*;
use studydesk_core::dashboard::FAULT_MESSAGE;
use studydesk_core::sink::{NullRenderer, RecordingNotifier};
use studydesk_core::timer::{ManualScheduler, Tick, TickSource, MAX_DURATION_MIN};
use studydesk_core::{
    CoreError, Dashboard, Flow, Intent, Phase, SessionKind, Severity, Store, TimerEngine,
    TimerKind, TokioScheduler,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

fn completions(store: &Store) -> usize {
    store
        .sessions()
        .iter()
        .filter(|s| s.kind == SessionKind::PomodoroCompleted)
        .count()
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_full_pomodoro_completes_exactly_once() {
    let mut store = Store::in_memory();
    let scheduler = ManualScheduler::new();
    let mut engine = TimerEngine::new();
    engine.start(&mut store, &scheduler).unwrap();

    let mut events = Vec::new();
    for _ in 0..1500 {
        events.extend(engine.tick(&mut store));
    }
    assert_eq!(events.len(), 1);
    assert_eq!(completions(&store), 1);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.remaining_secs(), 1500);
    assert_eq!(scheduler.live(TickSource::Timer), 0);

    let last = store.sessions().last().unwrap();
    assert_eq!(last.duration, Some(25));

    // Leftover ticks after completion change nothing.
    for _ in 0..10 {
        assert!(engine.tick(&mut store).is_none());
    }
    assert_eq!(completions(&store), 1);
}

#[test]
fn test_pause_resume_preserves_remaining() {
    let mut store = Store::in_memory();
    let scheduler = ManualScheduler::new();
    let mut engine = TimerEngine::new();
    engine.start(&mut store, &scheduler).unwrap();
    for _ in 0..100 {
        engine.tick(&mut store);
    }

    engine.pause().unwrap();
    let paused_at = engine.remaining_secs();
    for _ in 0..30 {
        engine.tick(&mut store);
    }
    assert_eq!(engine.remaining_secs(), paused_at);

    engine.start(&mut store, &scheduler).unwrap();
    assert_eq!(engine.remaining_secs(), paused_at);
    assert_eq!(engine.remaining_secs(), 1400);
    assert_eq!(scheduler.live(TickSource::Timer), 1);
}

#[test]
fn test_duration_locked_while_paused() {
    let mut store = Store::in_memory();
    let scheduler = ManualScheduler::new();
    let mut engine = TimerEngine::new();
    engine.start(&mut store, &scheduler).unwrap();
    engine.pause().unwrap();
    assert!(matches!(
        engine.set_duration(10),
        Err(CoreError::StateConflict(_))
    ));
    engine.reset();
    engine.set_duration(10).unwrap();
    assert_eq!(engine.total_secs(), 600);
}

proptest! {
    #[test]
    fn prop_set_duration_in_range(minutes in 0u32..200) {
        let mut engine = TimerEngine::new();
        let result = engine.set_duration(minutes);
        if (1..=MAX_DURATION_MIN).contains(&minutes) {
            prop_assert!(result.is_ok());
            prop_assert_eq!(engine.total_secs(), minutes * 60);
            prop_assert_eq!(engine.remaining_secs(), minutes * 60);
            prop_assert_eq!(engine.phase(), Phase::Idle);
            prop_assert_eq!(engine.progress(), 0.0);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(engine.total_secs(), 1500);
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[test]
fn test_dashboard_full_cycle_notifies_completion() {
    let notifier = RecordingNotifier::new();
    let scheduler = ManualScheduler::new();
    let mut dash = Dashboard::new(
        Store::in_memory(),
        Box::new(scheduler.clone()),
        Box::new(notifier.clone()),
        Box::new(NullRenderer),
    )
    .with_presets(1, 1);

    assert_eq!(dash.handle(Intent::QuickPomodoro), Flow::Continue);
    for _ in 0..60 {
        dash.on_tick(Tick {
            source: TickSource::Timer,
            handle_id: 1,
        });
    }
    assert_eq!(completions(dash.store()), 1);
    assert_eq!(
        notifier.last(),
        Some((Severity::Success, "Pomodoro completed! Great job!".to_string()))
    );
    assert!(!notifier
        .messages()
        .iter()
        .any(|(_, m)| m == FAULT_MESSAGE));
}

#[test]
fn test_skip_is_logged_as_completion() {
    let notifier = RecordingNotifier::new();
    let mut dash = Dashboard::new(
        Store::in_memory(),
        Box::new(ManualScheduler::new()),
        Box::new(notifier.clone()),
        Box::new(NullRenderer),
    );
    dash.handle(Intent::SkipTimer);
    assert_eq!(notifier.last().unwrap().0, Severity::Warning);
    assert_eq!(completions(dash.store()), 0);

    dash.handle(Intent::StartTimer);
    dash.handle(Intent::PauseTimer);
    dash.handle(Intent::SkipTimer);
    assert_eq!(completions(dash.store()), 1);
    assert_eq!(notifier.last().unwrap().1, "Timer skipped!");
    assert_eq!(dash.timer().phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_runs_a_break_to_completion() {
    let (scheduler, ticks) = TokioScheduler::channel();
    let (intents_tx, intents) = mpsc::channel(8);
    let notifier = RecordingNotifier::new();
    let dash = Dashboard::new(
        Store::in_memory(),
        Box::new(scheduler),
        Box::new(notifier.clone()),
        Box::new(NullRenderer),
    )
    .with_presets(25, 1)
    .with_exit_on_completion(true);

    intents_tx.send(Intent::TakeBreak).await.unwrap();
    let shutdown = CancellationToken::new();
    let dash = tokio::time::timeout(
        Duration::from_secs(120),
        dash.run(intents, ticks, shutdown),
    )
    .await
    .unwrap();

    assert_eq!(dash.timer().phase(), Phase::Idle);
    assert_eq!(dash.timer().state().kind, TimerKind::Break);
    let last = dash.store().sessions().last().unwrap();
    assert_eq!(last.kind, SessionKind::BreakCompleted);
    assert!(!dash.tips().is_rotating());
    assert_eq!(
        notifier.last().unwrap().1,
        "Break is over. Back to it!".to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_stops_on_shutdown() {
    let (scheduler, ticks) = TokioScheduler::channel();
    let (_intents_tx, intents) = mpsc::channel::<Intent>(8);
    let dash = Dashboard::new(
        Store::in_memory(),
        Box::new(scheduler),
        Box::new(RecordingNotifier::new()),
        Box::new(NullRenderer),
    );
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(dash.run(intents, ticks, shutdown.clone()));

    tokio::time::sleep(Duration::from_secs(90)).await;
    shutdown.cancel();
    let dash = handle.await.unwrap();
    assert!(!dash.tips().is_rotating());
    assert!(!dash.timer().is_ticking());
}
