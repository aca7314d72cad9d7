// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One fetched headline. `link` is the identity.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,  // publisher suffix already removed
    pub source: String, // e.g., "Reuters", "Space.com"
    pub link: String,
    pub snippet: String, // normalized text, may be empty
    pub published_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &str;
}
