//! Entities held by the [`Store`](crate::Store).
//!
//! Wire names are camelCase so snapshots and export documents stay
//! compatible with the dashboard's JSON backup format.

mod note;
mod session;
mod settings;
mod task;

pub use note::{format_file_size, Note, NoteFile};
pub use session::{Session, SessionKind, SESSION_HISTORY_CAP};
pub use settings::{SettingKey, Settings, SettingsPatch};
pub use task::{DueStatus, NewTask, Priority, Task};

/// Anything stored in a collection and addressed by id.
pub trait Record {
    fn id(&self) -> &str;
}

impl Record for Note {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Session {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Fresh opaque id for a new entity.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
