//! # Studydesk Core Library
//!
//! This library provides the core logic for the Studydesk study dashboard:
//! notes, a prioritized task list, a focus timer, session history and the
//! statistics derived from them. The `studydesk` CLI is a thin layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Store**: the single owner of notes, tasks, sessions and settings.
//!   Every mutation hands a snapshot to a [`PersistenceSink`]
//! - **Timer Engine**: a countdown state machine fed one tick per second
//!   by a cancellable [`Scheduler`] callback
//! - **Reporting**: daily, weekly and all-time aggregates over the store
//! - **Dashboard**: the event loop that turns user intents and ticks into
//!   mutations, notifications and renders
//!
//! ## Key Components
//!
//! - [`Store`]: Entity storage, import and export
//! - [`TimerEngine`]: Focus timer state machine
//! - [`Reporter`]: Statistics and summaries
//! - [`Dashboard`]: Event loop over intents and ticks
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod model;
pub mod report;
pub mod sink;
pub mod storage;
pub mod store;
pub mod timer;
pub mod tips;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dashboard::{Dashboard, Flow, Frame, Intent};
pub use error::{ConfigError, CoreError, StateConflict, StorageError, ValidationError};
pub use events::Event;
pub use model::{
    DueStatus, NewTask, Note, NoteFile, Priority, Session, SessionKind, SettingKey, Settings,
    Task,
};
pub use report::{DailySummary, Reporter, Statistics};
pub use sink::{MemorySink, Notifier, PersistenceSink, RenderSink, Severity};
pub use storage::{Config, JsonFileSink};
pub use store::{EditToken, NoteSearch, Snapshot, Store};
pub use timer::{Phase, Scheduler, TimerEngine, TimerKind, TimerState, TokioScheduler};
