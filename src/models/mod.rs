use serde::{Deserialize, Serialize};
use std::fmt;

/// Media server identifier of a library item (Plex `ratingKey`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One show record from the configured TV library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub id: ItemId,
    pub title: String,
}

/// Availability catalog identifier of a streaming provider (JustWatch `packageId`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub i64);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitored streaming provider, resolved from a configured display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
}

/// One entry of the availability source's provider catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProvider {
    pub id: ProviderId,
    pub clear_name: String,
    pub short_name: Option<String>,
    pub technical_name: Option<String>,
    pub monetization_types: Vec<String>,
}

/// One provider + monetization kind availability record for a show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub provider_id: ProviderId,
    /// e.g. "FLATRATE", "FREE", "ADS"
    pub monetization_kind: String,
    pub provider_short_name: String,
    pub provider_clear_name: String,
}

/// Best catalog match for a library title.
///
/// `offers` only ever contains offers for monitored providers. An empty list
/// means the show was found but is not streamable anywhere we track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedShow {
    pub title: String,
    pub external_id: String,
    pub offers: Vec<Offer>,
}

impl MatchedShow {
    pub fn has_offer_for(&self, provider_id: ProviderId) -> bool {
        self.offers.iter().any(|o| o.provider_id == provider_id)
    }
}

/// Show record from the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalShow {
    pub id: i64,
    pub name: String,
    pub status: Option<String>,
    pub imdb_id: Option<String>,
    pub thetvdb_id: Option<i64>,
}

impl ExternalShow {
    pub fn is_ended(&self) -> bool {
        self.status.as_deref() == Some("Ended")
    }
}

/// Identifier of a label written to the media server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelId {
    Provider(ProviderId),
    /// Synthetic marker for shows that finished airing
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

impl Label {
    pub const ENDED_NAME: &'static str = "Ended";

    pub fn ended() -> Self {
        Self {
            id: LabelId::Ended,
            name: Self::ENDED_NAME.to_string(),
        }
    }
}

impl From<&Provider> for Label {
    fn from(provider: &Provider) -> Self {
        Self {
            id: LabelId::Provider(provider.id),
            name: provider.name.clone(),
        }
    }
}

/// Outcome of reconciling one library item that matched in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub show: MatchedShow,
    pub ended: bool,
}
