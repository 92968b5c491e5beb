use crate::model::Note;

/// Outcome of a note search.
///
/// A blank term is not a search at all, which is different from a search
/// that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteSearch<'a> {
    NoQuery,
    Matches(Vec<&'a Note>),
}

impl<'a> NoteSearch<'a> {
    pub(crate) fn run(notes: &'a [Note], term: &str) -> Self {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return NoteSearch::NoQuery;
        }
        NoteSearch::Matches(notes.iter().filter(|n| n.matches(&needle)).collect())
    }

    pub fn is_no_query(&self) -> bool {
        matches!(self, NoteSearch::NoQuery)
    }

    /// Matching notes; empty for [`NoteSearch::NoQuery`].
    pub fn notes(&self) -> &[&'a Note] {
        match self {
            NoteSearch::NoQuery => &[],
            NoteSearch::Matches(notes) => notes,
        }
    }

    pub fn len(&self) -> usize {
        self.notes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes().is_empty()
    }

    /// Ids of the matching notes, `None` for a blank term.
    pub fn ids(&self) -> Option<Vec<String>> {
        match self {
            NoteSearch::NoQuery => None,
            NoteSearch::Matches(notes) => Some(notes.iter().map(|n| n.id.clone()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(id: &str, tag: &str, filename: &str) -> Note {
        Note {
            id: id.into(),
            tag: tag.into(),
            filename: filename.into(),
            size_bytes: 10,
            mime_type: "text/plain".into(),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn blank_term_is_no_query() {
        let notes = vec![note("1", "math", "a.txt")];
        assert!(NoteSearch::run(&notes, "   ").is_no_query());
        assert_eq!(NoteSearch::run(&notes, "").ids(), None);
    }

    #[test]
    fn no_match_is_empty_matches() {
        let notes = vec![note("1", "math", "a.txt")];
        let result = NoteSearch::run(&notes, "history");
        assert!(!result.is_no_query());
        assert!(result.is_empty());
        assert_eq!(result.ids(), Some(Vec::new()));
    }

    #[test]
    fn matches_tag_or_filename() {
        let notes = vec![
            note("1", "Math", "algebra.pdf"),
            note("2", "biology", "cells.pdf"),
            note("3", "chem", "MATH-review.txt"),
        ];
        let result = NoteSearch::run(&notes, " math ");
        assert_eq!(result.ids(), Some(vec!["1".to_string(), "3".to_string()]));
    }
}
