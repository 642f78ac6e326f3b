//! Predefined notification templates.
//!
//! A template turns a type tag plus a bag of loosely typed data into a
//! complete [`NotificationPayload`]. Unknown tags resolve to the `custom`
//! template; resolution never fails.

use crate::core::NotificationPayload;
use serde_json::{json, Map, Value};

pub const DEFAULT_ICON: &str = "/icon-192x192.png";

/// The notification templates the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskReminder,
    OverdueTasks,
    TeamUpdate,
    Custom,
}

impl NotificationKind {
    /// Maps a type tag to a template, falling back to `Custom`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "task_reminder" => Self::TaskReminder,
            "overdue_tasks" => Self::OverdueTasks,
            "team_update" => Self::TeamUpdate,
            _ => Self::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskReminder => "task_reminder",
            Self::OverdueTasks => "overdue_tasks",
            Self::TeamUpdate => "team_update",
            Self::Custom => "custom",
        }
    }
}

/// Builds notification payloads from templates.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    icon: String,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ICON)
    }
}

impl TemplateResolver {
    pub fn new(icon: impl Into<String>) -> Self {
        Self { icon: icon.into() }
    }

    /// Resolves `kind` against `data`.
    pub fn resolve(&self, kind: &str, data: &Map<String, Value>) -> NotificationPayload {
        let kind = NotificationKind::from_tag(kind);
        let mut payload_data = Map::new();
        payload_data.insert("url".to_string(), json!("/"));
        payload_data.insert("type".to_string(), json!(kind.as_str()));

        let (title, body, tag, require_interaction) = match kind {
            NotificationKind::TaskReminder => (
                "Task Reminder".to_string(),
                format!(
                    "Don't forget: {}",
                    text_field(data, "taskTitle").unwrap_or_else(|| "You have pending tasks".to_string())
                ),
                "task-reminder",
                None,
            ),
            NotificationKind::OverdueTasks => {
                let count = count_field(data);
                let suffix = if count > 1 { "s" } else { "" };
                (
                    "Overdue Tasks".to_string(),
                    format!("You have {} overdue task{}", count, suffix),
                    "overdue-tasks",
                    Some(true),
                )
            }
            NotificationKind::TeamUpdate => (
                "Team Update".to_string(),
                text_field(data, "message").unwrap_or_else(|| "There's a new team update".to_string()),
                "team-update",
                None,
            ),
            NotificationKind::Custom => {
                // Caller data wins over the defaults, including `url` and `type`.
                for (key, value) in data {
                    payload_data.insert(key.clone(), value.clone());
                }
                (
                    text_field(data, "title").unwrap_or_else(|| "Task Manager".to_string()),
                    text_field(data, "message").unwrap_or_else(|| "You have a new notification".to_string()),
                    "custom-notification",
                    None,
                )
            }
        };

        NotificationPayload {
            title,
            body,
            icon: self.icon.clone(),
            tag: tag.to_string(),
            data: payload_data,
            require_interaction,
        }
    }
}

/// Returns a text field, rendering numbers and `true` as text.
///
/// Empty strings, `0`, `false`, `null`, arrays and objects count as missing.
fn text_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Reads `count` from a number or a numeric string, treating a missing,
/// zero or non-numeric value as 1.
fn count_field(data: &Map<String, Value>) -> u64 {
    data.get("count")
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().map(|f| f.max(0.0) as u64))
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .filter(|&n| n > 0)
        .unwrap_or(1)
}
