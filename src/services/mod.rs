// Services module - backend clients and the reconciliation pipeline

use async_trait::async_trait;

use crate::models::{
    CatalogProvider, ExternalShow, ItemId, Label, LibraryItem, MatchedShow, Provider,
};

pub mod error;
pub mod providers;
pub mod reconcile;

// Backends
pub mod justwatch;
pub mod plex;
pub mod tvmaze;

pub use error::{Result, ServiceError};

/// Media server library listing
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// List every show in the configured library section
    async fn list_items(&self) -> Result<Vec<LibraryItem>>;
}

/// Writes availability labels onto media server items
#[async_trait]
pub trait LabelWriter: Send + Sync {
    /// Replace the labels of `item_id` with `labels`.
    ///
    /// Labels are a set: writing the same set twice leaves the server in the
    /// same state as writing it once. An empty set is a no-op.
    async fn apply_labels(&self, item_id: &ItemId, labels: &[Label]) -> Result<()>;
}

/// Streaming catalog lookups
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Full provider catalog for the configured region
    async fn list_providers(&self) -> Result<Vec<CatalogProvider>>;

    /// Single best match for `title`, offers filtered to `providers`
    async fn find_best_match(
        &self,
        title: &str,
        providers: &[Provider],
    ) -> Result<Option<MatchedShow>>;
}

/// Best-effort show metadata lookups
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Absent on no match and on any transport failure
    async fn lookup_status(&self, title: &str) -> Option<ExternalShow>;
}
