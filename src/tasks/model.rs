//! Task records as they are stored locally and in the remote gist.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown task status '{0}', expected pending, in-progress or completed")]
pub struct ParseStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A single tracked task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub assignee: String,
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub comments: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// A task is overdue when its due date has passed and it is not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && self.status != TaskStatus::Completed
    }

    /// Case-insensitive match against assignee, description and comments.
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.assignee.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.comments.to_lowercase().contains(needle)
    }
}

/// The user-supplied fields of a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub assignee: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub comments: String,
    pub status: TaskStatus,
}

/// Fields to change on an existing task; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub assignee: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub status: Option<TaskStatus>,
}
