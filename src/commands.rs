//! One-shot command handlers for the CLI.

use crate::{
    app::build_delivery,
    cli::{SyncCommand, TaskCommand, TaskFields, TaskUpdateFields},
    config::Config,
    core::Subscription,
    notification::{BroadcastReport, Broadcaster, SubscriberRegistry, TemplateResolver},
    storage::LocalStorage,
    sync::SyncService,
    tasks::{Task, TaskDraft, TaskFilter, TaskPatch, TaskStatus},
};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

fn open_sync(config: &Config) -> Result<SyncService> {
    let storage = LocalStorage::open(&config.storage.data_dir).with_context(|| {
        format!(
            "failed to open data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    Ok(SyncService::from_config(storage, &config.sync)?)
}

/// Runs a `task` subcommand, writing human-readable output to `out`.
pub async fn run_task_command(config: &Config, action: TaskCommand, out: &mut impl Write) -> Result<()> {
    let sync = open_sync(config)?;
    let mut list = sync.load().await?;

    match action {
        TaskCommand::Add(fields) => {
            let task = list.create(draft_from(fields), Utc::now()).clone();
            sync.save(&list).await?;
            info!(id = %task.id, "Task created successfully");
            writeln!(out, "Created {}", format_task(&task))?;
        }
        TaskCommand::Update { id, fields } => {
            let task = list.update(&id, patch_from(fields), Utc::now())?.clone();
            sync.save(&list).await?;
            info!(id = %task.id, "Task updated successfully");
            writeln!(out, "Updated {}", format_task(&task))?;
        }
        TaskCommand::Delete { id } => {
            let task = list.delete(&id)?;
            sync.save(&list).await?;
            info!(id = %task.id, "Task deleted successfully");
            writeln!(out, "Deleted {}", task.id)?;
        }
        TaskCommand::List { search, status } => {
            let status = parse_status_filter(&status)?;
            let tasks = list.filter(&TaskFilter { search, status });
            if tasks.is_empty() {
                writeln!(out, "No tasks found.")?;
            }
            for task in tasks {
                writeln!(out, "{}", format_task(task))?;
            }
        }
    }
    Ok(())
}

/// Runs a `sync` subcommand. Explicit pushes and pulls work even when
/// automatic sync is disabled.
pub async fn run_sync_command(config: &Config, action: SyncCommand, out: &mut impl Write) -> Result<()> {
    let sync = open_sync(config)?;
    match action {
        SyncCommand::Push => {
            let list = sync.load_local()?;
            let id = sync.push(list.as_slice()).await?;
            writeln!(out, "Pushed {} tasks to gist {}", list.len(), id)?;
        }
        SyncCommand::Pull => {
            let list = sync.pull().await?;
            writeln!(out, "Pulled {} tasks", list.len())?;
        }
    }
    Ok(())
}

/// Resolves a template and broadcasts it once to the given endpoints.
pub async fn run_notify_command(
    config: &Config,
    kind: &str,
    data: Option<&str>,
    endpoints: &[String],
) -> Result<BroadcastReport> {
    let data: Map<String, Value> = match data {
        Some(raw) => serde_json::from_str(raw).context("--data must be a JSON object")?,
        None => Map::new(),
    };

    let registry = Arc::new(SubscriberRegistry::new());
    for endpoint in endpoints {
        registry.add(Subscription::new(endpoint.clone()));
    }

    let broadcaster = Broadcaster::new(registry, build_delivery(&config.notifications)?);
    let payload = TemplateResolver::new(config.notifications.icon.clone()).resolve(kind, &data);
    Ok(broadcaster.broadcast(&payload).await)
}

fn parse_status_filter(raw: &str) -> Result<Option<TaskStatus>> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    Ok(Some(raw.parse()?))
}

fn draft_from(fields: TaskFields) -> TaskDraft {
    TaskDraft {
        assignee: fields.assignee,
        description: fields.description,
        due_date: fields.due.unwrap_or_else(|| Local::now().date_naive()),
        comments: fields.comments,
        status: fields.status,
    }
}

fn patch_from(fields: TaskUpdateFields) -> TaskPatch {
    TaskPatch {
        assignee: fields.assignee,
        description: fields.description,
        due_date: fields.due,
        comments: fields.comments,
        status: fields.status,
    }
}

/// One line per task; overdue tasks are flagged.
pub fn format_task(task: &Task) -> String {
    let overdue = if task.is_overdue(Local::now().date_naive()) {
        " [OVERDUE]"
    } else {
        ""
    };
    let mut line = format!(
        "{} [{}] {}: {} (due {}){}",
        task.id,
        task.status,
        task.assignee,
        task.description,
        task.due_date.format("%b %-d, %Y"),
        overdue
    );
    if !task.comments.is_empty() {
        line.push_str(&format!(" - {}", task.comments));
    }
    line
}
