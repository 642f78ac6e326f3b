//! In-memory task list operations.

use super::model::{Task, TaskDraft, TaskPatch, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("no task with id '{0}'")]
    NotFound(String),
}

/// Search and status criteria for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search: Option<String>,
    /// `None` matches every status.
    pub status: Option<TaskStatus>,
}

/// An ordered list of tasks, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn into_vec(self) -> Vec<Task> {
        self.tasks
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Adds a task at the front of the list.
    ///
    /// Ids are creation timestamps in milliseconds, bumped until unique.
    pub fn create(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> &Task {
        let mut id_num = now.timestamp_millis();
        while self.get(&id_num.to_string()).is_some() {
            id_num += 1;
        }

        let task = Task {
            id: id_num.to_string(),
            assignee: draft.assignee.trim().to_string(),
            description: draft.description.trim().to_string(),
            due_date: draft.due_date,
            comments: draft.comments.trim().to_string(),
            status: draft.status,
            created_at: now,
            updated_at: None,
        };
        self.tasks.insert(0, task);
        &self.tasks[0]
    }

    /// Applies `patch` to the task with `id` and stamps `updated_at`.
    pub fn update(
        &mut self,
        id: &str,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<&Task, TaskError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        if let Some(assignee) = patch.assignee {
            task.assignee = assignee.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(comments) = patch.comments {
            task.comments = comments.trim().to_string();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        task.updated_at = Some(now);
        Ok(task)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, TaskError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    pub fn filter<'a>(&'a self, filter: &TaskFilter) -> Vec<&'a Task> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        self.tasks
            .iter()
            .filter(|t| t.matches_text(&needle))
            .filter(|t| filter.status.map_or(true, |status| t.status == status))
            .collect()
    }

    pub fn overdue_count(&self, today: NaiveDate) -> u64 {
        self.tasks.iter().filter(|t| t.is_overdue(today)).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(assignee: &str, description: &str, due: NaiveDate, status: TaskStatus) -> TaskDraft {
        TaskDraft {
            assignee: assignee.to_string(),
            description: description.to_string(),
            due_date: due,
            comments: String::new(),
            status,
        }
    }

    #[test]
    fn test_create_prepends_with_unique_ids() {
        let mut list = TaskList::default();
        let first = list
            .create(draft("sam", "one", date(2026, 10, 20), TaskStatus::Pending), now())
            .id
            .clone();
        let second = list
            .create(draft("  kim ", "two", date(2026, 10, 21), TaskStatus::Pending), now())
            .id
            .clone();

        assert_ne!(first, second);
        assert_eq!(list.as_slice()[0].id, second);
        assert_eq!(list.as_slice()[0].assignee, "kim");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_update_merges_and_stamps() {
        let mut list = TaskList::default();
        let id = list
            .create(draft("sam", "one", date(2026, 10, 20), TaskStatus::Pending), now())
            .id
            .clone();
        let later = now() + chrono::Duration::hours(1);

        let updated = list
            .update(
                &id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.description, "one");
        assert_eq!(updated.updated_at, Some(later));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut list = TaskList::default();
        assert_eq!(
            list.update("nope", TaskPatch::default(), now()).unwrap_err(),
            TaskError::NotFound("nope".to_string())
        );
        assert!(list.delete("nope").is_err());
    }

    #[test]
    fn test_delete_removes_task() {
        let mut list = TaskList::default();
        let id = list
            .create(draft("sam", "one", date(2026, 10, 20), TaskStatus::Pending), now())
            .id
            .clone();

        let removed = list.delete(&id).unwrap();

        assert_eq!(removed.id, id);
        assert!(list.is_empty());
    }

    #[test]
    fn test_filter_by_text_and_status() {
        let mut list = TaskList::default();
        list.create(draft("Sam", "Quarterly report", date(2026, 10, 20), TaskStatus::Pending), now());
        list.create(draft("Kim", "Fix login", date(2026, 10, 20), TaskStatus::Completed), now());

        let by_text = list.filter(&TaskFilter {
            search: Some("REPORT".to_string()),
            status: None,
        });
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].assignee, "Sam");

        let by_status = list.filter(&TaskFilter {
            search: None,
            status: Some(TaskStatus::Completed),
        });
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].assignee, "Kim");

        assert_eq!(list.filter(&TaskFilter::default()).len(), 2);
    }

    #[test]
    fn test_overdue_count_ignores_completed_and_today() {
        let mut list = TaskList::default();
        let today = date(2026, 10, 18);
        list.create(draft("a", "late", date(2026, 10, 17), TaskStatus::Pending), now());
        list.create(draft("b", "late but done", date(2026, 10, 1), TaskStatus::Completed), now());
        list.create(draft("c", "due today", today, TaskStatus::InProgress), now());

        assert_eq!(list.overdue_count(today), 1);
    }
}
