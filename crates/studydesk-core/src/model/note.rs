use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded note file, filed under a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub tag: String,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// One file of an upload batch, before it becomes a [`Note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl NoteFile {
    pub fn new(filename: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }
}

impl Note {
    pub fn human_size(&self) -> String {
        format_file_size(self.size_bytes)
    }

    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.tag.to_lowercase().contains(needle) || self.filename.to_lowercase().contains(needle)
    }
}

/// Formats a byte count with base-1024 units, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn matches_tag_or_filename_case_insensitively() {
        let note = Note {
            id: "n1".into(),
            tag: "Physics".into(),
            filename: "Lecture-04.PDF".into(),
            size_bytes: 10,
            mime_type: "application/pdf".into(),
            uploaded_at: Utc::now(),
        };
        assert!(note.matches("phys"));
        assert!(note.matches("04.pdf"));
        assert!(!note.matches("chem"));
    }
}
