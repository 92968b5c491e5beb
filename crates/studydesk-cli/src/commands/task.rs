//! Task management commands for CLI.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use studydesk_core::error::EntityKind;
use studydesk_core::{DueStatus, Event, NewTask, Priority, Store, Task};

use super::{finish, open_store, print_json, resolve_id, short_id};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new task
    Add {
        /// Task text
        text: String,
        /// Priority: low, medium or high (default: low)
        #[arg(long, short, default_value = "low")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List tasks in display order
    List {
        /// Only tasks not yet completed
        #[arg(long, conflicts_with = "completed")]
        pending: bool,
        /// Only completed tasks
        #[arg(long)]
        completed: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a task between completed and pending
    Done {
        /// Task ID or unique prefix
        id: String,
    },
    /// Replace the text of a task
    Edit {
        /// Task ID or unique prefix
        id: String,
        /// New text
        text: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique prefix
        id: String,
    },
    /// Remove completed tasks, or every task with --all
    Clear {
        #[arg(long)]
        all: bool,
    },
}

fn find_id(store: &Store, needle: &str) -> Result<String, Box<dyn std::error::Error>> {
    resolve_id(store.tasks().iter().map(|t| t.id.as_str()), needle, EntityKind::Task)
}

fn print_line(task: &Task, today: NaiveDate) {
    let mark = if task.completed { "x" } else { " " };
    let due = match (task.due_date, task.due_status(today)) {
        (None, _) => String::new(),
        (Some(d), DueStatus::Overdue) if !task.completed => format!("  due {d} (overdue)"),
        (Some(d), DueStatus::DueSoon) if !task.completed => format!("  due {d} (soon)"),
        (Some(d), _) => format!("  due {d}"),
    };
    println!(
        "[{mark}] {}  {:<6}  {}{due}",
        short_id(&task.id),
        task.priority,
        task.text
    );
}

fn print_notice(event: &Event) {
    if let Some((message, _)) = event.notification() {
        println!("{message}");
    }
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        TaskAction::Add {
            text,
            priority,
            due,
        } => {
            let mut new = NewTask::new(text).priority(priority);
            if let Some(date) = due {
                new = new.due(date);
            }
            let task = store.add_task(new)?;
            println!("Task added: {}", task.id);
            print_json(task)?;
        }
        TaskAction::List {
            pending,
            completed,
            json,
        } => {
            let tasks: Vec<&Task> = store
                .sorted_tasks()
                .into_iter()
                .filter(|t| !(pending && t.completed) && !(completed && !t.completed))
                .collect();
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks yet. Add one above!");
            } else {
                let today = Local::now().date_naive();
                for task in tasks {
                    print_line(task, today);
                }
            }
        }
        TaskAction::Done { id } => {
            let id = find_id(&store, &id)?;
            let event = if store.toggle_task_completion(&id)? {
                Event::TaskCompleted { id }
            } else {
                Event::TaskReopened { id }
            };
            match event.notification() {
                Some((message, _)) => println!("{message}"),
                None => println!("Task reopened."),
            }
        }
        TaskAction::Edit { id, text } => {
            let id = find_id(&store, &id)?;
            let token = store.request_edit(&id)?;
            let id = store.commit_edit(token, &text)?.id.clone();
            print_notice(&Event::TaskUpdated { id });
        }
        TaskAction::Delete { id } => match find_id(&store, &id) {
            Ok(id) => {
                let existed = store.remove_task(&id);
                print_notice(&Event::TaskDeleted { id, existed });
            }
            Err(e) => println!("{e}; nothing deleted."),
        },
        TaskAction::Clear { all } => {
            let count = if all {
                store.clear_all_tasks()
            } else {
                store.clear_completed_tasks()
            };
            print_notice(&Event::TasksCleared {
                count,
                completed_only: !all,
            });
        }
    }
    finish(store)
}
