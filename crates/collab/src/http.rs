//! HTTP adapters for the task index and the pushlog.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{CollabError, Result};
use crate::traits::{Indexer, Push, Pushlog};

fn client() -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_default()
}

/// Task index REST client.
#[derive(Clone)]
pub struct HttpIndexer {
    client: Client,
    root_url: String,
    /// How long inserted entries live
    expiry: ChronoDuration,
}

impl HttpIndexer {
    /// Create a client for the service rooted at `root_url`.
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            client: client(),
            root_url: root_url.into().trim_end_matches('/').to_string(),
            expiry: ChronoDuration::days(365),
        }
    }

    /// Set the lifetime of inserted entries.
    pub fn with_expiry(mut self, expiry: ChronoDuration) -> Self {
        self.expiry = expiry;
        self
    }

    fn task_url(&self, index_path: &str) -> String {
        format!("{}/api/index/v1/task/{}", self.root_url, index_path)
    }
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn find_task(&self, index_path: &str) -> Result<Option<String>> {
        let url = self.task_url(index_path);
        debug!("Looking up index path {}", index_path);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CollabError::Status {
                service: "index",
                status: response.status().as_u16(),
                url,
            });
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct IndexedTask {
            task_id: String,
        }

        let indexed: IndexedTask = response.json().await?;
        Ok(Some(indexed.task_id))
    }

    async fn insert_task(&self, index_path: &str, task_id: &str) -> Result<()> {
        let url = self.task_url(index_path);
        let expires = Utc::now() + self.expiry;
        let payload = json!({
            "taskId": task_id,
            "rank": 0,
            "data": {},
            "expires": expires.to_rfc3339(),
        });

        debug!("Indexing task {} at {}", task_id, index_path);
        let response = self.client.put(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(CollabError::Status {
                service: "index",
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(())
    }
}

/// Pushlog client for `json-pushes`.
#[derive(Clone)]
pub struct HttpPushlog {
    client: Client,
}

impl HttpPushlog {
    /// Create a pushlog client.
    pub fn new() -> Self {
        Self { client: client() }
    }
}

impl Default for HttpPushlog {
    fn default() -> Self {
        Self::new()
    }
}

fn pushes_url(repository: &str, end_id: u64, depth: u64) -> String {
    format!(
        "{}/json-pushes?version=2&startID={}&endID={}",
        repository.trim_end_matches('/'),
        end_id.saturating_sub(depth),
        end_id
    )
}

#[derive(Deserialize)]
struct PushesResponse {
    pushes: BTreeMap<String, Push>,
}

fn parse_pushes(response: PushesResponse) -> Result<BTreeMap<u64, Push>> {
    response
        .pushes
        .into_iter()
        .map(|(id, push)| {
            id.parse::<u64>()
                .map(|id| (id, push))
                .map_err(|_| CollabError::Fatal(format!("pushlog returned non-numeric push id '{id}'")))
        })
        .collect()
}

#[async_trait]
impl Pushlog for HttpPushlog {
    async fn get_pushes(&self, repository: &str, end_id: u64, depth: u64) -> Result<BTreeMap<u64, Push>> {
        let url = pushes_url(repository, end_id, depth);
        debug!("Fetching pushes from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CollabError::Status {
                service: "pushlog",
                status: response.status().as_u16(),
                url,
            });
        }
        parse_pushes(response.json().await?)
    }
}
