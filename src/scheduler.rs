//! Recurring reminder notifications.
//!
//! Two independent triggers feed the broadcaster:
//! - an overdue task reminder on a fixed period (hourly by default);
//! - a daily summary at a local wall-clock time (09:00 by default), repeated
//!   on a fixed period after the first run.
//!
//! The daily target is computed once from local time. Daylight-saving shifts
//! and clock changes after that are not corrected for.

use crate::config::SchedulerConfig;
use crate::core::OverdueSource;
use crate::notification::{BroadcastReport, Broadcaster, TemplateResolver};
use crate::supervisor::Supervisor;
use anyhow::Result;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Returns the next local time of day `at` that lies after `now`.
///
/// If `now` is at or past today's `at`, the answer is tomorrow's `at`.
pub fn next_daily_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today <= now {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// How long to wait from `now` until the next daily occurrence of `at`.
pub fn delay_until(now: NaiveDateTime, at: NaiveTime) -> Duration {
    (next_daily_occurrence(now, at) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct Scheduler {
    broadcaster: Broadcaster,
    resolver: TemplateResolver,
    overdue: Arc<dyn OverdueSource>,
    overdue_period: Duration,
    daily_at: NaiveTime,
    daily_period: Duration,
    clock: Clock,
}

impl Scheduler {
    pub fn new(
        config: &SchedulerConfig,
        broadcaster: Broadcaster,
        resolver: TemplateResolver,
        overdue: Arc<dyn OverdueSource>,
    ) -> Result<Self> {
        Ok(Self {
            broadcaster,
            resolver,
            overdue,
            overdue_period: config.overdue_interval(),
            daily_at: config.daily_time()?,
            daily_period: config.daily_interval(),
            clock: Arc::new(|| Local::now().naive_local()),
        })
    }

    /// Replaces the local wall clock used for the daily target.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Resolves the overdue reminder and broadcasts it.
    ///
    /// Nothing is sent when the source reports zero overdue tasks.
    #[instrument(skip(self))]
    pub async fn check_and_send_overdue_reminders(&self) -> Option<BroadcastReport> {
        let count = self.overdue.overdue_count();
        if count == 0 {
            debug!("No overdue tasks; reminder skipped.");
            return None;
        }
        let data = as_map(json!({ "count": count }));
        let payload = self.resolver.resolve("overdue_tasks", &data);
        Some(self.broadcaster.broadcast(&payload).await)
    }

    #[instrument(skip(self))]
    pub async fn send_daily_summary(&self) -> BroadcastReport {
        let data = as_map(json!({
            "title": "Daily Summary",
            "message": "Good morning! Check your tasks for today.",
        }));
        let payload = self.resolver.resolve("custom", &data);
        self.broadcaster.broadcast(&payload).await
    }

    /// Spawns both triggers under `supervisor`.
    pub fn start(self: Arc<Self>, supervisor: &Supervisor) {
        let overdue = Arc::clone(&self);
        supervisor.spawn(
            "OverdueReminder",
            overdue.run_overdue_trigger(supervisor.shutdown_rx()),
        );
        supervisor.spawn("DailySummary", self.run_daily_trigger(supervisor.shutdown_rx()));
    }

    async fn run_overdue_trigger(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        info!(period_secs = self.overdue_period.as_secs(), "Overdue reminder scheduled.");
        // The first check runs one full period after start.
        let mut timer = interval_at(Instant::now() + self.overdue_period, self.overdue_period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Overdue reminder received shutdown signal.");
                    break;
                }
                _ = timer.tick() => {
                    self.check_and_send_overdue_reminders().await;
                }
            }
        }
    }

    async fn run_daily_trigger(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        let now = (self.clock)();
        let wait = delay_until(now, self.daily_at);
        info!(
            next = %next_daily_occurrence(now, self.daily_at),
            wait_secs = wait.as_secs(),
            "Daily summary scheduled."
        );

        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                info!("Daily summary received shutdown signal before first run.");
                return;
            }
            _ = sleep(wait) => {
                self.send_daily_summary().await;
            }
        }

        let mut timer = interval_at(Instant::now() + self.daily_period, self.daily_period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Daily summary received shutdown signal.");
                    break;
                }
                _ = timer.tick() => {
                    self.send_daily_summary().await;
                }
            }
        }
    }
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
