//! Keeps the local task list and the remote gist in step.
//!
//! There is no merging: whichever side is written last wins. Loading prefers
//! the remote copy when sync is enabled and falls back to local storage on any
//! failure. Saving always writes locally first, then pushes when enabled.
pub mod gist;

pub use gist::GistClient;

use crate::config::SyncConfig;
use crate::storage::{LocalStorage, StoreError, GIST_ID_KEY, TASKS_KEY};
use crate::tasks::{Task, TaskList};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no token configured for cloud sync")]
    MissingToken,

    #[error("no gist to sync with; push first or set sync.gist_id")]
    NoGist,

    #[error("gist API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gist request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gist content is not a valid task list: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct SyncService {
    storage: LocalStorage,
    gist: GistClient,
    enabled: bool,
    configured_gist_id: Option<String>,
}

impl SyncService {
    pub fn new(storage: LocalStorage, gist: GistClient, config: &SyncConfig) -> Self {
        Self {
            storage,
            gist,
            enabled: config.enabled,
            configured_gist_id: config.gist_id.clone(),
        }
    }

    pub fn from_config(storage: LocalStorage, config: &SyncConfig) -> Result<Self, SyncError> {
        let gist = GistClient::new(&config.api_base, config.token.clone())?;
        Ok(Self::new(storage, gist, config))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The configured gist id, or the one remembered from a previous push.
    pub fn gist_id(&self) -> Result<Option<String>, StoreError> {
        if let Some(id) = &self.configured_gist_id {
            return Ok(Some(id.clone()));
        }
        Ok(self
            .storage
            .get_item(GIST_ID_KEY)?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn load_local(&self) -> Result<TaskList, StoreError> {
        let tasks: Option<Vec<Task>> = self.storage.load_json(TASKS_KEY)?;
        Ok(TaskList::new(tasks.unwrap_or_default()))
    }

    pub fn save_local(&self, list: &TaskList) -> Result<(), StoreError> {
        self.storage.save_json(TASKS_KEY, &list.as_slice())
    }

    /// Loads the task list, preferring the remote copy when sync is enabled.
    ///
    /// A remote copy replaces the local one.
    pub async fn load(&self) -> Result<TaskList, StoreError> {
        if self.enabled {
            match self.fetch_remote().await {
                Ok(Some(list)) => {
                    self.save_local(&list)?;
                    return Ok(list);
                }
                Ok(None) => debug!("No remote task list, using local storage"),
                Err(e) => info!(error = %e, "Cloud storage not available, using local storage"),
            }
        }
        self.load_local()
    }

    /// Saves locally, then pushes when sync is enabled.
    ///
    /// A failed push is logged; the local copy is already written.
    pub async fn save(&self, list: &TaskList) -> Result<(), StoreError> {
        self.save_local(list)?;
        if self.enabled {
            if let Err(e) = self.push(list.as_slice()).await {
                warn!(error = %e, "Failed to sync to cloud. Data saved locally.");
            }
        }
        Ok(())
    }

    /// Pushes `tasks` to the gist, creating it on first use.
    #[instrument(skip_all)]
    pub async fn push(&self, tasks: &[Task]) -> Result<String, SyncError> {
        if !self.gist.has_token() {
            info!("No token available for sync");
            return Err(SyncError::MissingToken);
        }
        let existing = self.gist_id()?;
        let id = self.gist.push_tasks(existing.as_deref(), tasks).await?;
        if existing.is_none() {
            self.storage.set_item(GIST_ID_KEY, &id)?;
            info!(gist_id = %id, "Created gist for task sync");
        }
        info!("Data synced to cloud successfully.");
        Ok(id)
    }

    /// Replaces the local task list with the remote one.
    pub async fn pull(&self) -> Result<TaskList, SyncError> {
        let list = self.fetch_remote().await?.ok_or(SyncError::NoGist)?;
        self.save_local(&list)?;
        Ok(list)
    }

    async fn fetch_remote(&self) -> Result<Option<TaskList>, SyncError> {
        let Some(id) = self.gist_id()? else {
            return Ok(None);
        };
        Ok(self.gist.fetch_tasks(&id).await?.map(TaskList::new))
    }

    /// Pushes the local task list every `period` until shutdown.
    pub async fn run_auto_sync(self: Arc<Self>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        if !self.enabled {
            debug!("Cloud sync disabled; auto-sync not started.");
            return;
        }
        info!(period_secs = period.as_secs(), "Auto-sync started.");
        let mut timer = interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Auto-sync received shutdown signal.");
                    break;
                }
                _ = timer.tick() => {
                    match self.load_local() {
                        Ok(list) => {
                            if let Err(e) = self.push(list.as_slice()).await {
                                warn!(error = %e, "Cloud sync failed");
                            }
                        }
                        Err(e) => error!(error = %e, "Could not read local tasks for sync"),
                    }
                }
            }
        }
    }
}
