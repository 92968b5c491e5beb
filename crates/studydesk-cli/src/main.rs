use clap::{CommandFactory, Parser, Subcommand};
use studydesk_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "studydesk", version, about = "Study dashboard: focus timer, tasks, notes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Study notes
    Note {
        #[command(subcommand)]
        action: commands::note::NoteAction,
    },
    /// Focus and break timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Recent activity
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Progress statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Backup export and import
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Dashboard preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Study tips
    Tip {
        #[command(subcommand)]
        action: commands::tip::TipAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    logging::init(&config.logging.level);

    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Note { action } => commands::note::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Data { action } => commands::data::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Tip { action } => commands::tip::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studydesk", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
