//! Configuration management for taskbell
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, a `taskbell.toml` file, environment
//! variables and command-line arguments, in that order.

use crate::cli::Cli;
use anyhow::{Context, Result};
use chrono::NaiveTime;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "taskbell.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level, used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Where tasks and sync state are kept on disk.
    pub storage: StorageConfig,
    /// Push notification delivery.
    pub notifications: NotificationConfig,
    /// Recurring reminders.
    pub scheduler: SchedulerConfig,
    /// Remote task list synchronization.
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Directory holding one file per stored key.
    pub data_dir: PathBuf,
}

/// Which backend delivers notifications to subscribers.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Log the notification and report success.
    Logging,
    /// POST the payload JSON to the subscription endpoint.
    Http,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    pub delivery: DeliveryKind,
    /// Request timeout for the HTTP delivery backend.
    pub http_timeout_ms: u64,
    /// Icon attached to every templated notification.
    pub icon: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Period of the overdue task reminder.
    pub overdue_interval_seconds: u64,
    /// Local wall-clock time of the daily summary, `HH:MM` or `HH:MM:SS`.
    pub daily_summary_time: String,
    /// Period of the daily summary after its first run.
    pub daily_interval_seconds: u64,
    /// Count overdue tasks from storage instead of reporting a fixed count of one.
    pub count_overdue_tasks: bool,
}

impl SchedulerConfig {
    pub fn overdue_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_interval_seconds)
    }

    pub fn daily_interval(&self) -> Duration {
        Duration::from_secs(self.daily_interval_seconds)
    }

    /// Parses `daily_summary_time`.
    pub fn daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_summary_time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&self.daily_summary_time, "%H:%M"))
            .with_context(|| {
                format!(
                    "invalid scheduler.daily_summary_time '{}', expected HH:MM",
                    self.daily_summary_time
                )
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SyncConfig {
    pub enabled: bool,
    /// Base URL of the gist API.
    pub api_base: String,
    /// Personal access token used for writes.
    #[serde(default)]
    pub token: Option<String>,
    /// Gist to sync with. When unset, the id stored by a previous push is used.
    #[serde(default)]
    pub gist_id: Option<String>,
    /// Period of the background push.
    pub interval_seconds: u64,
}

impl Config {
    /// Loads the configuration, layering defaults, the TOML file, `TASKBELL_`
    /// environment variables and the command-line arguments.
    ///
    /// Nested keys are separated by `__` in the environment, e.g.
    /// `TASKBELL_SYNC__TOKEN`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("TASKBELL_").split("__"))
            .merge(cli.clone())
            .extract()
            .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot drive the runtime.
    pub fn validate(&self) -> Result<()> {
        self.scheduler.daily_time()?;
        require_period("scheduler.overdue_interval_seconds", self.scheduler.overdue_interval_seconds)?;
        require_period("scheduler.daily_interval_seconds", self.scheduler.daily_interval_seconds)?;
        require_period("sync.interval_seconds", self.sync.interval_seconds)?;
        Ok(())
    }
}

fn require_period(key: &str, seconds: u64) -> Result<()> {
    (seconds > 0)
        .then_some(())
        .with_context(|| format!("invalid {}: the period must be at least one second", key))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            storage: StorageConfig {
                data_dir: PathBuf::from("./data"),
            },
            notifications: NotificationConfig {
                delivery: DeliveryKind::Logging,
                http_timeout_ms: 10_000,
                icon: crate::notification::templates::DEFAULT_ICON.to_string(),
            },
            scheduler: SchedulerConfig {
                enabled: true,
                overdue_interval_seconds: 3600,
                daily_summary_time: "09:00".to_string(),
                daily_interval_seconds: 86_400,
                count_overdue_tasks: false,
            },
            sync: SyncConfig {
                enabled: false,
                api_base: "https://api.github.com".to_string(),
                token: None,
                gist_id: None,
                interval_seconds: 300,
            },
        }
    }
}
