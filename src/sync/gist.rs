//! A client for the gist API used as remote task storage.
//!
//! The whole task list lives in a single `tasks.json` file of one gist.

use super::SyncError;
use crate::tasks::Task;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

pub const TASKS_FILE: &str = "tasks.json";
const GIST_DESCRIPTION: &str = "Task Manager Data";

#[derive(Debug, Deserialize)]
struct GistResponse {
    id: String,
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
}

pub struct GistClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GistClient {
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("taskbell/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Fetches the task list stored in `gist_id`.
    ///
    /// Returns `Ok(None)` when the gist has no `tasks.json` file.
    #[instrument(skip(self))]
    pub async fn fetch_tasks(&self, gist_id: &str) -> Result<Option<Vec<Task>>, SyncError> {
        let url = format!("{}/gists/{}", self.api_base, gist_id);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let gist: GistResponse = Self::check(request.send().await?).await?.json().await?;
        let Some(content) = gist.files.get(TASKS_FILE).and_then(|f| f.content.as_deref()) else {
            debug!("Gist has no {} file", TASKS_FILE);
            return Ok(None);
        };
        let tasks = serde_json::from_str(content)?;
        Ok(Some(tasks))
    }

    /// Writes `tasks` to the gist, creating a private gist when `gist_id` is
    /// `None`. Returns the gist id.
    #[instrument(skip(self, tasks), fields(count = tasks.len()))]
    pub async fn push_tasks(
        &self,
        gist_id: Option<&str>,
        tasks: &[Task],
    ) -> Result<String, SyncError> {
        let token = self.token.as_deref().ok_or(SyncError::MissingToken)?;
        let content = serde_json::to_string_pretty(tasks)?;
        let mut files = serde_json::Map::new();
        files.insert(TASKS_FILE.to_string(), json!({ "content": content }));

        let request = match gist_id {
            Some(id) => self
                .client
                .patch(format!("{}/gists/{}", self.api_base, id))
                .json(&json!({ "files": files })),
            None => self
                .client
                .post(format!("{}/gists", self.api_base))
                .json(&json!({
                    "description": GIST_DESCRIPTION,
                    "public": false,
                    "files": files,
                })),
        };

        let response = request
            .header("Authorization", format!("token {}", token))
            .send()
            .await?;
        let gist: GistResponse = Self::check(response).await?.json().await?;
        debug!(gist_id = %gist.id, "Tasks pushed to gist");
        Ok(gist.id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SyncError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
