use clap::Subcommand;
use studydesk_core::report::relative_day;
use studydesk_core::Reporter;

use super::{open_store, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time statistics
    Show {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Today's focus minutes and completed tasks
    Today {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// The last seven days, oldest first
    Week {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimated minutes per activity
    Distribution {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let reporter = Reporter::local(&store);

    match action {
        StatsAction::Show { json } => {
            let stats = reporter.statistics();
            if json {
                print_json(&stats)?;
            } else {
                println!("Notes:            {}", stats.total_notes);
                println!("Tasks:            {}", stats.total_tasks);
                println!("Completed:        {}", stats.completed_tasks);
                println!("Completion rate:  {}%", stats.completion_rate);
                println!("Pomodoros:        {}", stats.total_pomodoros);
                println!("Focus time:       {}", stats.focus_time_display());
                println!("Average session:  {}m", stats.average_session_minutes);
            }
        }
        StatsAction::Today { json } => {
            let today = reporter.daily_summary(reporter.today());
            if json {
                print_json(&today)?;
            } else {
                println!("Focus minutes:    {}", today.focus_minutes);
                println!("Tasks completed:  {}", today.completed_tasks);
            }
        }
        StatsAction::Week { json } => {
            let today = reporter.today();
            if json {
                let days: Vec<_> = reporter.weekly_series().collect();
                print_json(&days)?;
            } else {
                for day in reporter.weekly_series() {
                    println!(
                        "{} {:<11} {:>4}m focus  {:>2} tasks",
                        day.weekday,
                        relative_day(day.date, today),
                        day.focus_minutes,
                        day.completed_tasks
                    );
                }
            }
        }
        StatsAction::Distribution { json } => {
            let dist = reporter.activity_distribution();
            if json {
                print_json(&dist)?;
            } else {
                println!("Focus:  {}m", dist.focus_minutes);
                println!("Breaks: {}m", dist.break_minutes);
                println!("Tasks:  {}m", dist.task_minutes);
            }
        }
    }
    Ok(())
}
