//! Backup export and import.

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use studydesk_core::Event;

use super::{finish, open_store};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write a full backup document
    Export {
        /// Output file (default: study-dashboard-backup-<date>.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Replace all data with a backup document
    Import {
        /// Backup file
        path: PathBuf,
    },
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        DataAction::Export { output, stdout } => {
            let json = store.export_json()?;
            if stdout {
                println!("{json}");
            } else {
                let path = output.unwrap_or_else(|| {
                    PathBuf::from(format!(
                        "study-dashboard-backup-{}.json",
                        Local::now().format("%Y-%m-%d")
                    ))
                });
                std::fs::write(&path, json)?;
                println!("Data exported to {}", path.display());
            }
        }
        DataAction::Import { path } => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            store.import_json(&json)?;
            let event = Event::DataImported {
                notes: store.notes().len(),
                tasks: store.tasks().len(),
                sessions: store.sessions().len(),
            };
            if let Some((message, _)) = event.notification() {
                println!("{message}");
            }
        }
    }
    finish(store)
}
