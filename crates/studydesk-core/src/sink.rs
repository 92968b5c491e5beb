//! Collaborators the core calls out to: persistence, notifications and
//! rendering.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::dashboard::Frame;
use crate::error::StorageError;
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Stores and restores whole-store snapshots.
pub trait PersistenceSink: Send {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<Snapshot>, StorageError>;
}

/// Fire-and-forget user notifications. Must not block.
pub trait Notifier: Send {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Receives the current state after every mutation.
pub trait RenderSink: Send {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Keeps the latest snapshot in memory. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    /// The last saved snapshot.
    pub fn latest(&self) -> Option<Snapshot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceSink for MemorySink {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }

    fn load(&mut self) -> Result<Option<Snapshot>, StorageError> {
        Ok(self.latest())
    }
}

/// Sends notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(%message, "notification"),
            Severity::Warning => warn!(%message, "notification"),
            Severity::Success | Severity::Info => info!(%message, %severity, "notification"),
        }
    }
}

/// Collects notifications for later inspection. Clones share the list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<(Severity, String)> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, message.to_string()));
    }
}

/// Discards frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn render(&mut self, _frame: &Frame<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_slot() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        assert!(sink.latest().is_none());
        writer.save(&Snapshot::default()).unwrap();
        assert_eq!(sink.latest(), Some(Snapshot::default()));
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        let mut handle = notifier.clone();
        handle.notify("first", Severity::Info);
        handle.notify("second", Severity::Error);
        assert_eq!(
            notifier.last(),
            Some((Severity::Error, "second".to_string()))
        );
        assert_eq!(notifier.messages().len(), 2);
    }
}
