// Plex Media Server client
// Lists a TV library section and writes labels back onto shows

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::error::{Result, ServiceError};
use super::{LabelWriter, LibrarySource};
use crate::config::PlexConfig;
use crate::models::{ItemId, Label, LibraryItem};

const SERVICE: &str = "Plex";
// Sent as a header so the token never ends up in request URLs or their errors
const TOKEN_HEADER: &str = "X-Plex-Token";

/// Plex API client bound to one library section
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
    library: String,
}

#[derive(Debug, Deserialize)]
struct SectionResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MediaContainer,
}

#[derive(Debug, Deserialize)]
struct MediaContainer {
    // Absent when the section is empty
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    title: String,
}

impl PlexClient {
    pub fn new(config: &PlexConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            library: config.library.clone(),
        }
    }

    fn section_url(&self) -> String {
        format!(
            "{}/library/sections/{}/all",
            self.base_url,
            urlencoding::encode(&self.library)
        )
    }

    fn metadata_url(&self, item_id: &ItemId) -> String {
        format!(
            "{}/library/metadata/{}",
            self.base_url,
            urlencoding::encode(&item_id.0)
        )
    }
}

#[async_trait]
impl LibrarySource for PlexClient {
    async fn list_items(&self) -> Result<Vec<LibraryItem>> {
        tracing::debug!("Plex: listing library section {}", self.library);

        let response = self
            .client
            .get(self.section_url())
            .header(TOKEN_HEADER, self.token.as_str())
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::status(SERVICE, &response));
        }

        let section: SectionResponse = response.json().await?;

        Ok(section
            .media_container
            .metadata
            .into_iter()
            .map(|m| LibraryItem {
                id: ItemId(m.rating_key),
                title: m.title,
            })
            .collect())
    }
}

#[async_trait]
impl LabelWriter for PlexClient {
    async fn apply_labels(&self, item_id: &ItemId, labels: &[Label]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }

        let query: Vec<(&str, &str)> = labels
            .iter()
            .map(|label| ("label[].tag.tag", label.name.as_str()))
            .collect();

        tracing::debug!(
            "Plex: setting labels on {}: {:?}",
            item_id,
            labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>()
        );

        let response = self
            .client
            .put(self.metadata_url(item_id))
            .query(&query)
            .header(TOKEN_HEADER, self.token.as_str())
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::status(SERVICE, &response));
        }

        Ok(())
    }
}
