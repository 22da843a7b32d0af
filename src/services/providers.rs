// Provider directory
// Resolves configured provider display names against the catalog

use std::collections::HashSet;

use super::error::Result;
use super::AvailabilitySource;
use crate::models::{CatalogProvider, Provider};

/// How many catalog names to show when a configured name doesn't resolve
const SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResolution {
    /// Resolved providers, in configured order, unique by id
    pub providers: Vec<Provider>,
    /// Configured names without an exact catalog match
    pub unresolved: Vec<String>,
    /// A few catalog names, for diagnosing unresolved entries
    pub available_sample: Vec<String>,
}

impl ProviderResolution {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Fetch the catalog once and resolve `configured_names` against it
pub async fn resolve(
    source: &dyn AvailabilitySource,
    configured_names: &[String],
) -> Result<ProviderResolution> {
    let catalog = source.list_providers().await?;
    let resolution = resolve_from_catalog(&catalog, configured_names);

    for name in &resolution.unresolved {
        match suggest(&catalog, name) {
            Some(hint) => tracing::warn!(
                "Provider '{}' not found in catalog (did you mean '{}'?)",
                name,
                hint
            ),
            None => tracing::warn!("Provider '{}' not found in catalog", name),
        }
    }
    if !resolution.is_complete() {
        tracing::warn!(
            "Some available providers: {}",
            resolution.available_sample.join(", ")
        );
    }

    Ok(resolution)
}

/// Exact, case-sensitive match of each configured name on `clear_name`
pub fn resolve_from_catalog(
    catalog: &[CatalogProvider],
    configured_names: &[String],
) -> ProviderResolution {
    let mut resolution = ProviderResolution::default();
    let mut seen = HashSet::new();

    for name in configured_names {
        match catalog.iter().find(|p| &p.clear_name == name) {
            Some(entry) => {
                if seen.insert(entry.id) {
                    tracing::debug!(
                        "Provider '{}' -> id {} ({} / {}, {})",
                        name,
                        entry.id,
                        entry.short_name.as_deref().unwrap_or("-"),
                        entry.technical_name.as_deref().unwrap_or("-"),
                        entry.monetization_types.join("/")
                    );
                    resolution.providers.push(Provider {
                        id: entry.id,
                        name: entry.clear_name.clone(),
                    });
                } else {
                    tracing::debug!("Provider '{}' listed twice, ignoring duplicate", name);
                }
            }
            None => resolution.unresolved.push(name.clone()),
        }
    }

    if !resolution.unresolved.is_empty() {
        resolution.available_sample = catalog
            .iter()
            .take(SAMPLE_SIZE)
            .map(|p| p.clear_name.clone())
            .collect();
    }

    resolution
}

/// Case-insensitive near miss, used only as a hint in warnings
fn suggest<'a>(catalog: &'a [CatalogProvider], name: &str) -> Option<&'a str> {
    let wanted = name.trim().to_lowercase();
    catalog
        .iter()
        .find(|p| p.clear_name.to_lowercase() == wanted)
        .map(|p| p.clear_name.as_str())
}
