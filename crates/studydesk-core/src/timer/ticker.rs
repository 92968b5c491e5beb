//! Cancellable periodic callbacks.
//!
//! A [`Scheduler`] hands out one [`TickHandle`] per recurring callback. The
//! spawned task pushes [`Tick`]s into the dashboard's channel until the
//! handle is cancelled or dropped. Each tick carries the id of the handle
//! that produced it, so a tick already queued when its handle was cancelled
//! can be recognised and discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSource {
    /// One-second countdown tick.
    Timer,
    /// Study tip rotation.
    Tip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub source: TickSource,
    pub handle_id: u64,
}

/// Owner of a live periodic callback. Cancels it when dropped.
#[derive(Debug)]
pub struct TickHandle {
    id: u64,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// A handle with no task behind it, cancelled through `token`.
    pub fn detached(id: u64, token: CancellationToken) -> Self {
        Self {
            id,
            token,
            task: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub trait Scheduler: Send {
    /// Starts a callback firing every `period`, first firing one period
    /// from now.
    fn every(&self, source: TickSource, period: Duration) -> TickHandle;
}

/// Spawns interval tasks on the current tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Tick>,
    next_id: Arc<AtomicU64>,
}

impl TokioScheduler {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (scheduler, rx)
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, source: TickSource, period: Duration) -> TickHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Tick { source, handle_id: id }).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(?source, id, "tick task stopped");
        });

        debug!(?source, id, ?period, "tick task started");
        TickHandle {
            id,
            token,
            task: Some(task),
        }
    }
}

/// Scheduler that spawns nothing and records what was requested.
///
/// Tests drive ticks by hand and use this to check how many callbacks
/// are live.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    issued: Arc<Mutex<Vec<(TickSource, CancellationToken)>>>,
    next_id: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles for `source` that have not been cancelled.
    pub fn live(&self, source: TickSource) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(s, token)| *s == source && !token.is_cancelled())
            .count()
    }

    /// Handles ever issued for `source`.
    pub fn issued(&self, source: TickSource) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(s, _)| *s == source)
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, source: TickSource, _period: Duration) -> TickHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        self.issued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((source, token.clone()));
        TickHandle::detached(id, token)
    }
}
