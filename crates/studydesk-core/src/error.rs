//! Core error types for studydesk-core.
//!
//! Every failure is user-correctable or benign: nothing here is fatal to the
//! process. The [`Dashboard`](crate::Dashboard) turns errors into
//! notifications using [`CoreError::severity`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::sink::Severity;

/// Core error type for studydesk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// User input that can be corrected and retried.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An operation referenced an id that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// The timer is in the wrong phase for the requested transition.
    #[error("{0}")]
    StateConflict(#[from] StateConflict),

    /// Persistence sink errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Notification severity used when surfacing this error.
    pub fn severity(&self) -> Severity {
        match self {
            CoreError::Validation(_) => Severity::Error,
            CoreError::NotFound { .. } | CoreError::StateConflict(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// True for faults the user cannot fix by changing their input.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(_) | CoreError::Config(_) | CoreError::Io(_) | CoreError::Json(_)
        )
    }
}

/// Entity kinds that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Note,
    Task,
    Session,
    EditToken,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Note => "Note",
            EntityKind::Task => "Task",
            EntityKind::Session => "Session",
            EntityKind::EditToken => "Edit token",
        };
        f.write_str(name)
    }
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task description.")]
    EmptyTaskText,

    #[error("Please enter a tag for your notes.")]
    EmptyTag,

    #[error("Please select files to upload.")]
    NoFiles,

    #[error("Please enter a valid time between {min}-{max} minutes (got {got}).")]
    DurationOutOfRange { got: u32, min: u32, max: u32 },

    /// Import document is missing required fields or cannot be parsed.
    #[error("Invalid backup file format: {0}")]
    MalformedImport(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Timer transitions rejected because of the current phase.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateConflict {
    #[error("Timer is already running.")]
    AlreadyRunning,

    #[error("Timer is not running.")]
    NotRunning,

    #[error("No active session to skip.")]
    NotActive,

    #[error("Stop the current timer before setting a new one.")]
    DurationLocked,
}

/// Persistence sink errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read snapshot from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write snapshot to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Could not determine data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
