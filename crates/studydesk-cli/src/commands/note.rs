//! Study note commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use studydesk_core::error::EntityKind;
use studydesk_core::report::relative_time;
use studydesk_core::{Event, Note, NoteFile, NoteSearch, Store};

use super::{finish, open_store, print_json, resolve_id, short_id};

#[derive(Subcommand)]
pub enum NoteAction {
    /// Register files as notes under a tag
    Add {
        /// Subject tag for the batch
        #[arg(long, short)]
        tag: String,
        /// Files to register
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List notes
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Search notes by tag or filename
    Search {
        /// Case-insensitive search term
        term: String,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one note
    Show {
        /// Note ID or unique prefix
        id: String,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique prefix
        id: String,
    },
}

fn find_id(store: &Store, needle: &str) -> Result<String, Box<dyn std::error::Error>> {
    resolve_id(store.notes().iter().map(|n| n.id.as_str()), needle, EntityKind::Note)
}

fn mime_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn note_file(path: PathBuf) -> Result<NoteFile, Box<dyn std::error::Error>> {
    let meta = std::fs::metadata(&path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format!("not a file: {}", path.display()))?;
    Ok(NoteFile::new(filename, meta.len(), mime_type_for(&path)))
}

fn print_table<'a>(notes: impl IntoIterator<Item = &'a Note>, store: &Store) {
    let now = store.now();
    for note in notes {
        println!(
            "{}  [{}]  {}  {}  {}",
            short_id(&note.id),
            note.tag,
            note.filename,
            note.human_size(),
            relative_time(note.uploaded_at, now)
        );
    }
}

pub fn run(action: NoteAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        NoteAction::Add { tag, files } => {
            let files = files
                .into_iter()
                .map(note_file)
                .collect::<Result<Vec<_>, _>>()?;
            let count = store.add_notes(&tag, files)?.len();
            let event = Event::NotesUploaded {
                tag: tag.trim().to_string(),
                count,
            };
            if let Some((message, _)) = event.notification() {
                println!("{message}");
            }
        }
        NoteAction::List { json } => {
            if json {
                print_json(store.notes())?;
            } else if store.notes().is_empty() {
                println!("No notes uploaded yet.");
            } else {
                print_table(store.notes(), &store);
            }
        }
        NoteAction::Search { term, json } => match store.search_notes(&term) {
            NoteSearch::NoQuery => println!("Enter a search term."),
            NoteSearch::Matches(found) if json => print_json(&found)?,
            NoteSearch::Matches(found) if found.is_empty() => {
                println!("No notes match \"{}\".", term.trim());
            }
            NoteSearch::Matches(found) => print_table(found, &store),
        },
        NoteAction::Show { id } => {
            let id = find_id(&store, &id)?;
            if let Some(note) = store.note(&id) {
                println!("Selected: {}", note.filename);
                print_json(note)?;
            }
        }
        NoteAction::Delete { id } => match find_id(&store, &id) {
            Ok(id) => {
                let existed = store.remove_note(&id);
                let event = Event::NoteDeleted { id, existed };
                if let Some((message, _)) = event.notification() {
                    println!("{message}");
                }
            }
            Err(e) => println!("{e}; nothing deleted."),
        },
    }
    finish(store)
}
