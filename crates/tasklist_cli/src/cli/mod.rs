use clap::{Parser, Subcommand};
use tasklist_core::config::ConfigOverrides;
use tasklist_core::error::AppError;
use tasklist_core::model::{Priority, PriorityFilter, SortKey};

#[derive(Parser, Debug)]
#[command(name = "tasklist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

impl Cli {
    pub fn overrides(&self) -> Result<ConfigOverrides, AppError> {
        let mut overrides = ConfigOverrides::default();
        for raw in &self.config_override {
            overrides.apply(raw)?;
        }
        Ok(overrides)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk" --priority high --reminder 60
    Add {
        text: Option<String>,
        /// high, medium or low
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Seconds until the reminder fires
        #[arg(short, long, value_name = "SECONDS")]
        reminder: Option<u64>,
    },
    /// Edit a task's text, priority or reminder delay
    ///
    /// Example: tasklist edit task-1 "Buy oat milk" --priority low
    Edit {
        id: String,
        text: String,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(short, long, value_name = "SECONDS")]
        reminder: Option<u64>,
    },
    /// Mark a task as completed, or reopen a completed one
    ///
    /// Example: tasklist toggle task-1
    #[command(alias = "done")]
    Toggle { id: String },
    /// Delete a task
    ///
    /// Example: tasklist delete task-1
    Delete { id: String },
    /// Restore the most recently deleted task
    ///
    /// Only available within a few seconds of the delete, in the same session.
    Undo,
    /// Show details of a task
    ///
    /// Example: tasklist show task-1
    Show { id: String },
    /// List tasks
    ///
    /// In interactive mode the sort and filter stay in effect for later
    /// `list` calls.
    ///
    /// Example: tasklist list --sort priority --filter high
    List {
        /// newest, priority, completed or reminder
        #[arg(long)]
        sort: Option<SortKey>,
        /// all, high, medium or low
        #[arg(long)]
        filter: Option<PriorityFilter>,
    },
    /// Deliver reminders that are due
    ///
    /// Example: tasklist notify
    Notify,
}
