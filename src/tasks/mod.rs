//! Task tracking: the task model, list operations and the overdue counter
//! used by the reminder scheduler.
pub mod list;
pub mod model;

pub use list::{TaskError, TaskFilter, TaskList};
pub use model::{Task, TaskDraft, TaskPatch, TaskStatus};

use crate::core::OverdueSource;
use crate::storage::{LocalStorage, TASKS_KEY};
use chrono::{Local, NaiveDate};
use tracing::warn;

/// Counts overdue tasks in local storage each time it is asked.
#[derive(Debug, Clone)]
pub struct StoredOverdueCount {
    storage: LocalStorage,
}

impl StoredOverdueCount {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Counts the stored tasks overdue as of `today`. Unreadable storage
    /// counts as zero.
    pub fn count_on(&self, today: NaiveDate) -> u64 {
        match self.storage.load_json::<Vec<Task>>(TASKS_KEY) {
            Ok(tasks) => TaskList::new(tasks.unwrap_or_default()).overdue_count(today),
            Err(e) => {
                warn!(error = %e, "Could not read tasks for overdue count");
                0
            }
        }
    }
}

impl OverdueSource for StoredOverdueCount {
    fn overdue_count(&self) -> u64 {
        self.count_on(Local::now().date_naive())
    }
}
