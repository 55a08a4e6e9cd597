use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use taskmaster::config::Config;
use taskmaster::model::{Cadence, WindowStatus};
use taskmaster::{cli, Engine, Storage};

#[derive(Parser)]
#[command(
    name = "taskmaster",
    about = "Taskmaster — recurring task tracker with execution-window scheduling",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Data directory for the SQLite database and config.toml
    #[arg(long, env = "TASKMASTER_DATA_DIR", global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKMASTER_LOG", global = true)]
    log: Option<String>,

    /// Log output format: "pretty" (default) | "json"
    #[arg(long, env = "TASKMASTER_LOG_FORMAT", global = true)]
    log_format: Option<String>,

    /// Emit results as JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Record that a task was performed.
    ///
    /// If an open execution window contains the instant, the window is marked
    /// hit and the execution is linked to it.
    ///
    /// Examples:
    ///   taskmaster do 3
    ///   taskmaster do 3 --at "2024-01-11 08:00"
    Do {
        task_id: i64,
        /// When the task was performed (default: now).
        /// Accepts "YYYY-MM-DD HH:MM", "YYYY-MM-DD", or "MM-DD".
        #[arg(long)]
        at: Option<String>,
    },
    /// Manage execution windows.
    Window {
        #[command(subcommand)]
        action: WindowAction,
    },
    /// Manage task frequencies.
    Frequency {
        #[command(subcommand)]
        action: FrequencyAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Create a task (attaches a default daily frequency).
    Add { name: String },
    /// List all tasks.
    List,
    /// Show a task with its frequency, windows, and executions.
    Show { task_id: i64 },
}

#[derive(Subcommand)]
enum WindowAction {
    /// Derive the next window from the task's frequency and schedule it.
    ///
    /// If an open window already overlaps the derived interval, nothing is
    /// persisted and the existing window is reported instead.
    Next { task_id: i64 },
    /// Schedule a window manually.
    Add {
        task_id: i64,
        /// Window start ("YYYY-MM-DD HH:MM", "YYYY-MM-DD", or "MM-DD")
        start: String,
        /// Window end (exclusive)
        end: String,
    },
    /// Close an open window as skipped or missed.
    Close {
        window_id: i64,
        #[arg(value_enum)]
        status: CloseStatus,
    },
}

#[derive(Subcommand)]
enum FrequencyAction {
    /// Replace the task's frequency.
    Set {
        task_id: i64,
        #[arg(value_enum)]
        kind: CadenceKind,
        /// Day of week for weekly frequencies (1-7, Monday=1)
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=7))]
        day_of_week: Option<i64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CadenceKind {
    Daily,
    Weekly,
}

#[derive(Clone, Copy, ValueEnum)]
enum CloseStatus {
    Skipped,
    Missed,
}

impl From<CloseStatus> for WindowStatus {
    fn from(status: CloseStatus) -> Self {
        match status {
            CloseStatus::Skipped => WindowStatus::Skipped,
            CloseStatus::Missed => WindowStatus::Missed,
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str) {
    // Keep stdout clean for command output; logs go to stderr.
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::new(args.data_dir, args.log, args.log_format);
    init_tracing(&config.log, &config.log_format);

    let storage = Storage::new(&config.data_dir).await?;
    let engine = Engine::new(storage);
    let json = args.json;

    match args.command {
        Command::Task { action } => match action {
            TaskAction::Add { name } => cli::task_add(&engine, &name, json).await?,
            TaskAction::List => cli::task_list(&engine, json).await?,
            TaskAction::Show { task_id } => cli::task_show(&engine, task_id, json).await?,
        },
        Command::Do { task_id, at } => cli::do_task(&engine, task_id, at.as_deref(), json).await?,
        Command::Window { action } => match action {
            WindowAction::Next { task_id } => cli::window_next(&engine, task_id, json).await?,
            WindowAction::Add {
                task_id,
                start,
                end,
            } => cli::window_add(&engine, task_id, &start, &end, json).await?,
            WindowAction::Close { window_id, status } => {
                cli::window_close(&engine, window_id, status.into(), json).await?
            }
        },
        Command::Frequency { action } => match action {
            FrequencyAction::Set {
                task_id,
                kind,
                day_of_week,
            } => {
                let cadence = match kind {
                    CadenceKind::Daily => Cadence::Daily,
                    CadenceKind::Weekly => Cadence::Weekly {
                        day_of_week: day_of_week.unwrap_or(1),
                    },
                };
                cli::frequency_set(&engine, task_id, cadence, json).await?
            }
        },
    }

    Ok(())
}
