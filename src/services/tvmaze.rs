// TVMaze metadata client
// API Documentation: https://www.tvmaze.com/api

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::MetadataSource;
use crate::models::ExternalShow;

const TVMAZE_API_BASE: &str = "https://api.tvmaze.com";

/// TVMaze API client (no API key needed)
pub struct TvMazeClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TvMazeShow {
    id: i64,
    name: String,
    status: Option<String>,
    externals: Option<TvMazeExternals>,
}

#[derive(Debug, Deserialize)]
struct TvMazeExternals {
    imdb: Option<String>,
    thetvdb: Option<i64>,
}

impl TvMazeClient {
    pub fn new() -> Self {
        Self::with_base_url(TVMAZE_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Single best match for `title`, `Ok(None)` when TVMaze has nothing
    async fn single_search(&self, title: &str) -> anyhow::Result<Option<TvMazeShow>> {
        let url = format!(
            "{}/singlesearch/shows?q={}",
            self.base_url,
            urlencoding::encode(title)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status().as_u16() != 404 {
                tracing::warn!("TVMaze search failed for '{}': {}", title, response.status());
            }
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }
}

impl Default for TvMazeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for TvMazeClient {
    async fn lookup_status(&self, title: &str) -> Option<ExternalShow> {
        match self.single_search(title).await {
            Ok(Some(show)) => {
                tracing::debug!("TVMaze: '{}' -> {} ({:?})", title, show.name, show.status);
                let externals = show.externals;
                Some(ExternalShow {
                    id: show.id,
                    name: show.name,
                    status: show.status,
                    imdb_id: externals.as_ref().and_then(|e| e.imdb.clone()),
                    thetvdb_id: externals.and_then(|e| e.thetvdb),
                })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("TVMaze lookup for '{}' failed: {}", title, e);
                None
            }
        }
    }
}
