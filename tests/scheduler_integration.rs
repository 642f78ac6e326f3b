//! Scheduler timing tests, run on a paused clock.

mod helpers;

use chrono::{NaiveDate, Utc};
use helpers::{local_time, registry_with, test_config};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use taskbell::app::App;
use taskbell::core::FixedOverdueCount;
use taskbell::storage::{LocalStorage, TASKS_KEY};
use taskbell::tasks::{TaskDraft, TaskList, TaskStatus};
use taskbell::test_utils::RecordingDelivery;
use tempfile::tempdir;
use tokio::time::sleep;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

fn store_tasks(dir: &Path, tasks: &[(NaiveDate, TaskStatus)]) {
    let mut list = TaskList::default();
    for (due_date, status) in tasks {
        list.create(
            TaskDraft {
                assignee: "Sam".to_string(),
                description: "Write report".to_string(),
                due_date: *due_date,
                comments: String::new(),
                status: *status,
            },
            Utc::now(),
        );
    }
    let storage = LocalStorage::open(dir).unwrap();
    storage.save_json(TASKS_KEY, &list.as_slice()).unwrap();
}

fn count(titles: &[String], title: &str) -> usize {
    titles.iter().filter(|t| t.as_str() == title).count()
}

#[tokio::test(start_paused = true)]
async fn test_daily_summary_waits_for_nine_and_overdue_runs_hourly() {
    // Arrange: local time is 08:00, so the daily summary is one hour away.
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    let delivery = RecordingDelivery::new();
    let app = App::builder(config)
        .delivery_override(Arc::new(delivery.clone()))
        .registry(registry_with(&["https://push.example.com/a"]))
        .clock_override(|| local_time(8, 0))
        .build()
        .await
        .unwrap();

    // Nothing fires in the first half hour.
    sleep(30 * MINUTE).await;
    assert!(delivery.sent().is_empty());

    // Both triggers fire at the one hour mark.
    sleep(31 * MINUTE).await;
    let titles = delivery.sent_titles();
    assert_eq!(count(&titles, "Daily Summary"), 1);
    assert_eq!(count(&titles, "Overdue Tasks"), 1);

    // One more hour: another overdue reminder, no second summary.
    sleep(HOUR).await;
    let titles = delivery.sent_titles();
    assert_eq!(count(&titles, "Daily Summary"), 1);
    assert_eq!(count(&titles, "Overdue Tasks"), 2);

    // A day later the summary repeats.
    sleep(24 * HOUR).await;
    let titles = delivery.sent_titles();
    assert_eq!(count(&titles, "Daily Summary"), 2);

    app.run_until(async {}).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_daily_summary_after_nine_waits_until_tomorrow() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    let delivery = RecordingDelivery::new();
    let app = App::builder(config)
        .delivery_override(Arc::new(delivery.clone()))
        .registry(registry_with(&["https://push.example.com/a"]))
        .overdue_override(Arc::new(FixedOverdueCount(0)))
        .clock_override(|| local_time(10, 0))
        .build()
        .await
        .unwrap();

    sleep(22 * HOUR + 59 * MINUTE).await;
    assert!(delivery.sent().is_empty(), "no summary before 09:00 tomorrow and no overdue tasks");

    sleep(2 * MINUTE).await;
    assert_eq!(delivery.sent_titles(), vec!["Daily Summary"]);

    app.run_until(async {}).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_overdue_reminder_uses_reported_count() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    let delivery = RecordingDelivery::new();
    let app = App::builder(config)
        .delivery_override(Arc::new(delivery.clone()))
        .registry(registry_with(&["https://push.example.com/a"]))
        .overdue_override(Arc::new(FixedOverdueCount(3)))
        .clock_override(|| local_time(12, 0))
        .build()
        .await
        .unwrap();

    sleep(HOUR + MINUTE).await;

    let sent = delivery.sent();
    assert_eq!(sent.len(), 1);
    let payload = &sent[0].1;
    assert_eq!(payload.body, "You have 3 overdue tasks");
    assert_eq!(payload.require_interaction, Some(true));

    app.run_until(async {}).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_counted_overdue_skips_reminder_without_overdue_tasks() {
    let dir = tempdir().unwrap();
    store_tasks(
        dir.path(),
        &[
            (NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), TaskStatus::Completed),
            (NaiveDate::from_ymd_opt(2999, 1, 1).unwrap(), TaskStatus::Pending),
        ],
    );
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    config.scheduler.count_overdue_tasks = true;
    let delivery = RecordingDelivery::new();
    let app = App::builder(config)
        .delivery_override(Arc::new(delivery.clone()))
        .registry(registry_with(&["https://push.example.com/a"]))
        .clock_override(|| local_time(12, 0))
        .build()
        .await
        .unwrap();

    sleep(2 * HOUR + MINUTE).await;

    assert_eq!(count(&delivery.sent_titles(), "Overdue Tasks"), 0);
    app.run_until(async {}).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_counted_overdue_reports_stored_tasks() {
    let dir = tempdir().unwrap();
    store_tasks(
        dir.path(),
        &[
            (NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), TaskStatus::Pending),
            (NaiveDate::from_ymd_opt(2000, 1, 2).unwrap(), TaskStatus::InProgress),
            (NaiveDate::from_ymd_opt(2000, 1, 3).unwrap(), TaskStatus::Completed),
        ],
    );
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    config.scheduler.count_overdue_tasks = true;
    let delivery = RecordingDelivery::new();
    let app = App::builder(config)
        .delivery_override(Arc::new(delivery.clone()))
        .registry(registry_with(&["https://push.example.com/a"]))
        .clock_override(|| local_time(12, 0))
        .build()
        .await
        .unwrap();

    sleep(HOUR + MINUTE).await;

    let sent = delivery.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.body, "You have 2 overdue tasks");
    app.run_until(async {}).await.unwrap();
}

#[tokio::test]
async fn test_zero_overdue_period_fails_to_build() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.scheduler.enabled = true;
    config.scheduler.overdue_interval_seconds = 0;

    let result = App::builder(config)
        .delivery_override(Arc::new(RecordingDelivery::new()))
        .build()
        .await;

    assert!(result.is_err());
}
