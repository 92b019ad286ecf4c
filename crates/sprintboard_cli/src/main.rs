//! `sprintboard` command line entry point.
//!
//! # Responsibility
//! - Load config, start logging and open the task store.
//! - Map subcommands onto `TaskService` operations.
//!
//! # Invariants
//! - Every failure is reported on stderr with a non-zero exit code.
//! - Without a configured database path the store lives in memory for the
//!   duration of one command.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use sprintboard_core::db::{open_db, open_db_in_memory};
use sprintboard_core::{
    core_version, init_logging_from_config, CoreConfig, NewTask, Priority,
    SqliteKeyValueRepository, Task, TaskId, TaskService,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sprintboard")]
#[command(about = "Task board backed by a local snapshot store", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// SQLite database file; overrides `storage.db_path`
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core version
    Version,
    /// List tasks, optionally only those due on one day
    List {
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Add a pending task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Due date in YYYY-MM-DD
        #[arg(long)]
        due: String,
        #[arg(short, long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
        #[arg(short, long)]
        assignee: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Flip a task between pending and completed
    Toggle { id: TaskId },
    /// Delete a task; unknown ids are ignored
    Delete { id: TaskId },
    /// Print task statistics
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Version = cli.command {
        println!("sprintboard_core version={}", core_version());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => CoreConfig::load_from_path(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.storage.db_path = Some(db);
    }
    init_logging_from_config(&config.logging)?;

    let conn = match &config.storage.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let repo = SqliteKeyValueRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let mut store = TaskService::open(repo, config.storage.tasks_key.as_str());

    match cli.command {
        Commands::Version => {}
        Commands::List { date } => {
            let tasks = match date {
                Some(raw) => store.tasks_for_date(parse_date(&raw)?),
                None => store.list_tasks(),
            };
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                print_task(task);
            }
        }
        Commands::Add {
            title,
            due,
            priority,
            assignee,
            description,
        } => {
            let mut request = NewTask::pending(title, parse_date(&due)?, priority.into());
            request.assigned_to = assignee.unwrap_or_default();
            request.description = description.unwrap_or_default();
            let task = store.add_task(request);
            info!("event=cli_add module=cli status=ok task_id={}", task.id);
            print_task(&task);
        }
        Commands::Toggle { id } => {
            let task = store.toggle_task_status(id).map_err(|err| err.to_string())?;
            print_task(&task);
        }
        Commands::Delete { id } => {
            store.delete_task(id);
            println!("Deleted {id}.");
        }
        Commands::Stats => {
            let stats = store.stats();
            println!(
                "total={} completed={} pending={} ({:.0}% done)",
                stats.total_tasks,
                stats.completed_tasks,
                stats.pending_tasks,
                stats.completion_ratio() * 100.0
            );
            let by_priority: Vec<String> = [Priority::High, Priority::Medium, Priority::Low]
                .into_iter()
                .map(|priority| {
                    format!(
                        "{}={}",
                        priority_label(priority),
                        stats.tasks_by_priority.get(priority)
                    )
                })
                .collect();
            println!("pending by priority: {}", by_priority.join(" "));
        }
    }

    // Mutations already persisted on commit; this surfaces a failed write.
    store.flush().map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date `{raw}` (expected YYYY-MM-DD): {err}"))
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

fn print_task(task: &Task) {
    let mark = if task.is_pending() { " " } else { "x" };
    let assignee = if task.assigned_to.is_empty() {
        "-"
    } else {
        task.assigned_to.as_str()
    };
    println!(
        "[{mark}] {} {} due={} priority={} assignee={}",
        task.id,
        task.title,
        task.due_date,
        priority_label(task.priority),
        assignee
    );
}
