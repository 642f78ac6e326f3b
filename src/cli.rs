//! Command-Line Interface (CLI) argument parsing.
//!
//! The global options are also a `figment` provider so they can override
//! values from `taskbell.toml` and the environment.

use crate::tasks::TaskStatus;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Task tracking with push reminders.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory used for local storage.
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the notification service: read events from stdin and fire scheduled reminders.
    Serve,
    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Resolve a notification template and broadcast it once.
    Notify {
        /// Template type (task_reminder, overdue_tasks, team_update, custom).
        kind: String,
        /// Template data as a JSON object.
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
        /// Subscriber endpoint; may be repeated.
        #[arg(long = "endpoint", value_name = "URL")]
        endpoints: Vec<String>,
    },
    /// Synchronize tasks with the remote gist.
    Sync {
        #[command(subcommand)]
        action: SyncCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Create a task.
    Add(TaskFields),
    /// Change fields of an existing task.
    Update {
        id: String,
        #[command(flatten)]
        fields: TaskUpdateFields,
    },
    /// Delete a task.
    Delete { id: String },
    /// List tasks, newest first.
    List {
        /// Case-insensitive text matched against assignee, description and comments.
        #[arg(long)]
        search: Option<String>,
        /// Status to show, or "all".
        #[arg(long, default_value = "all")]
        status: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TaskFields {
    #[arg(long)]
    pub assignee: String,
    #[arg(long)]
    pub description: String,
    /// Due date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub due: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    pub comments: String,
    #[arg(long, default_value = "pending")]
    pub status: TaskStatus,
}

#[derive(Args, Debug, Clone)]
pub struct TaskUpdateFields {
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub due: Option<NaiveDate>,
    #[arg(long)]
    pub comments: Option<String>,
    #[arg(long)]
    pub status: Option<TaskStatus>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SyncCommand {
    /// Upload the local task list.
    Push,
    /// Replace the local task list with the remote one.
    Pull,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut figment = Figment::new();

        if let Some(dir) = &self.data_dir {
            figment = figment.merge(Serialized::default("storage.data_dir", dir));
        }

        if let Some(level) = &self.log_level {
            figment = figment.merge(Serialized::default("log_level", level));
        }

        figment.data()
    }
}
