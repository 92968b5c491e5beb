use std::path::PathBuf;

use clap::Subcommand;
use studydesk_core::report::relative_time;
use studydesk_core::{Event, Reporter};

use super::{finish, open_store, print_json};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show recent activity, newest first
    List {
        /// Number of entries to show
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the progress log as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print a plain-text session summary
    Summary,
    /// Clear all recorded progress
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        HistoryAction::List { limit, json } => {
            let recent: Vec<_> = store.recent_sessions(limit).collect();
            if json {
                print_json(&recent)?;
            } else if recent.is_empty() {
                println!("No recent activity.");
            } else {
                let now = store.now();
                for session in recent {
                    println!(
                        "{:<18}  {}  ({})",
                        session.kind.label(),
                        session.description,
                        relative_time(session.timestamp, now)
                    );
                }
            }
        }
        HistoryAction::Export { output } => {
            let log = Reporter::local(&store).progress_log();
            let json = serde_json::to_string_pretty(&log)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Progress exported!");
                }
                None => println!("{json}"),
            }
        }
        HistoryAction::Summary => print!("{}", Reporter::local(&store).summary_text()),
        HistoryAction::Clear => {
            let count = store.clear_history();
            if let Some((message, _)) = (Event::HistoryCleared { count }).notification() {
                println!("{message}");
            }
        }
    }
    finish(store)
}
