//! Live focus timer.
//!
//! Runs the dashboard event loop in the foreground. Line commands on stdin
//! control the countdown; Ctrl-C or `q` ends the session.

use std::io::Write;

use clap::Subcommand;
use studydesk_core::dashboard::Frame;
use studydesk_core::timer::{Phase, Tick};
use studydesk_core::{
    Config, Dashboard, Intent, Notifier, RenderSink, Severity, Store, TokioScheduler,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::open_store;

const HELP: &str = "commands: p = pause/resume, r = reset, s = skip, n = next tip, q = quit";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a focus session
    Run {
        /// Session length in minutes (1-120, default from config)
        #[arg(long, short)]
        minutes: Option<u32>,
        /// Keep the dashboard open after the countdown completes
        #[arg(long)]
        stay: bool,
    },
    /// Run a focus session with the configured preset
    Quick,
    /// Run a break with the configured preset
    Break,
}

/// Prints notifications on their own line.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        println!("\r[{severity}] {message}");
    }
}

/// Redraws the countdown line whenever it changes.
#[derive(Default)]
struct ConsoleRenderer {
    last: String,
}

impl RenderSink for ConsoleRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        let phase = match frame.timer.phase {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
        };
        let line = format!(
            "{} {:>3}% {phase:<7} | Tip: {}",
            frame.clock(),
            frame.progress_percent(),
            frame.tip
        );
        if line != self.last {
            print!("\r{line}");
            let _ = std::io::stdout().flush();
            self.last = line;
        }
    }
}

fn parse_command(line: &str) -> Option<Intent> {
    match line.trim() {
        "p" => Some(Intent::ToggleTimer),
        "r" => Some(Intent::ResetTimer),
        "s" => Some(Intent::SkipTimer),
        "n" => Some(Intent::NextTip),
        _ => None,
    }
}

async fn read_commands(intents: mpsc::Sender<Intent>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) if line.trim() == "q" => {
                shutdown.cancel();
                break;
            }
            Ok(Some(line)) => match parse_command(&line) {
                Some(intent) => {
                    if intents.send(intent).await.is_err() {
                        break;
                    }
                }
                None => println!("\r{HELP}"),
            },
            Ok(None) | Err(_) => break,
        }
    }
    debug!("stdin reader stopped");
}

async fn session(
    dashboard: Dashboard,
    first: Intent,
    ticks: mpsc::UnboundedReceiver<Tick>,
) -> Result<Dashboard, Box<dyn std::error::Error>> {
    let (intents_tx, intents) = mpsc::channel(16);
    let shutdown = CancellationToken::new();

    intents_tx.send(first).await?;
    tokio::spawn(read_commands(intents_tx.clone(), shutdown.clone()));

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    println!("{HELP}");
    let dashboard = dashboard.run(intents, ticks, shutdown.clone()).await;
    shutdown.cancel();
    drop(intents_tx);
    println!();
    Ok(dashboard)
}

async fn drive(
    config: Config,
    store: Store,
    first: Intent,
    stay: bool,
) -> Result<Dashboard, Box<dyn std::error::Error>> {
    let (scheduler, ticks) = TokioScheduler::channel();
    let mut dashboard = Dashboard::new(
        store,
        Box::new(scheduler),
        Box::new(ConsoleNotifier),
        Box::<ConsoleRenderer>::default(),
    )
    .with_presets(config.timer.focus_minutes, config.timer.break_minutes)
    .with_tip_period(config.tips.period())
    .with_exit_on_completion(!stay);

    // Custom lengths are validated before the loop starts.
    let first = match first {
        Intent::SetDuration(minutes) => {
            dashboard.apply(Intent::SetDuration(minutes))?;
            Intent::StartTimer
        }
        other => other,
    };
    session(dashboard, first, ticks).await
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = open_store()?;

    let (first, stay) = match action {
        TimerAction::Run { minutes, stay } => {
            let minutes = minutes.unwrap_or(config.timer.focus_minutes);
            (Intent::SetDuration(minutes), stay)
        }
        TimerAction::Quick => (Intent::QuickPomodoro, false),
        TimerAction::Break => (Intent::TakeBreak, false),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(config, store, first, stay));
    runtime.shutdown_background();
    if result?.store().has_unsaved_changes() {
        return Err("session history could not be saved".into());
    }
    Ok(())
}
