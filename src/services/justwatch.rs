// JustWatch streaming catalog client
// Unofficial GraphQL API used by the justwatch.com web app

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{Result, ServiceError};
use super::AvailabilitySource;
use crate::config::JustWatchConfig;
use crate::models::{CatalogProvider, MatchedShow, Offer, Provider, ProviderId};

const JUSTWATCH_GRAPHQL_URL: &str = "https://apis.justwatch.com/graphql";
const SERVICE: &str = "JustWatch";

/// Number of suggestions requested per search; only the first is used
const SEARCH_PAGE_SIZE: u32 = 4;

const GET_PACKAGES_QUERY: &str = r#"
    query GetPackages($platform: Platform! = WEB, $country: Country!) {
        packages(country: $country, platform: $platform, includeAddons: false) {
            clearName
            id
            shortName
            technicalName
            packageId
            monetizationTypes
        }
    }
"#;

const GET_SUGGESTED_TITLES_QUERY: &str = r#"
    query GetSuggestedTitles($country: Country!, $language: Language!, $first: Int!, $filter: TitleFilter) {
        popularTitles(country: $country, first: $first, filter: $filter) {
            edges {
                node {
                    id
                    objectType
                    objectId
                    content(country: $country, language: $language) {
                        title
                        originalReleaseYear
                        fullPath
                    }
                    offers(country: $country, platform: WEB) {
                        monetizationType
                        package {
                            packageId
                            shortName
                            clearName
                            technicalName
                        }
                    }
                }
            }
        }
    }
"#;

/// JustWatch API client for one country/language
pub struct JustWatchClient {
    client: Client,
    endpoint: String,
    country: String,
    language: String,
}

/// GraphQL request wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLRequest<'a> {
    operation_name: &'a str,
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PackagesData {
    packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Package {
    clear_name: String,
    package_id: i64,
    short_name: Option<String>,
    technical_name: Option<String>,
    #[serde(default)]
    monetization_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopularTitlesData {
    popular_titles: Option<TitleConnection>,
}

#[derive(Debug, Deserialize)]
struct TitleConnection {
    #[serde(default)]
    edges: Vec<TitleEdge>,
}

#[derive(Debug, Deserialize)]
struct TitleEdge {
    node: TitleNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleNode {
    object_id: i64,
    object_type: Option<String>,
    content: TitleContent,
    #[serde(default)]
    offers: Vec<TitleOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleContent {
    title: String,
    original_release_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitleOffer {
    monetization_type: String,
    package: OfferPackage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferPackage {
    package_id: i64,
    short_name: String,
    clear_name: String,
}

impl JustWatchClient {
    pub fn new(config: &JustWatchConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: JUSTWATCH_GRAPHQL_URL.to_string(),
            country: config.country.clone(),
            language: config.language.clone(),
        }
    }

    /// Point the client at a different GraphQL endpoint
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let request = GraphQLRequest {
            operation_name,
            query,
            variables,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Referer", "https://www.justwatch.com/")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("JustWatch {} failed: {} - {}", operation_name, status, text);
            return Err(ServiceError::Status {
                service: SERVICE,
                status,
            });
        }

        let body: GraphQLResponse<T> = response.json().await?;

        match body.data {
            Some(data) => Ok(data),
            None if body.errors.is_empty() => Err(ServiceError::Decode {
                service: SERVICE,
                field: "data",
            }),
            None => Err(ServiceError::GraphQl {
                service: SERVICE,
                message: body
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }
}

#[async_trait]
impl AvailabilitySource for JustWatchClient {
    async fn list_providers(&self) -> Result<Vec<CatalogProvider>> {
        let variables = serde_json::json!({
            "platform": "WEB",
            "country": self.country,
        });

        let data: PackagesData = self
            .graphql("GetPackages", GET_PACKAGES_QUERY, variables)
            .await?;

        tracing::debug!(
            "JustWatch: {} providers available in {}",
            data.packages.len(),
            self.country
        );

        Ok(data
            .packages
            .into_iter()
            .map(|p| CatalogProvider {
                id: ProviderId(p.package_id),
                clear_name: p.clear_name,
                short_name: p.short_name,
                technical_name: p.technical_name,
                monetization_types: p.monetization_types,
            })
            .collect())
    }

    async fn find_best_match(
        &self,
        title: &str,
        providers: &[Provider],
    ) -> Result<Option<MatchedShow>> {
        let variables = serde_json::json!({
            "country": self.country,
            "language": self.language,
            "first": SEARCH_PAGE_SIZE,
            "filter": { "searchQuery": title },
        });

        let data: PopularTitlesData = self
            .graphql("GetSuggestedTitles", GET_SUGGESTED_TITLES_QUERY, variables)
            .await?;

        let Some(node) = data
            .popular_titles
            .and_then(|c| c.edges.into_iter().next())
            .map(|e| e.node)
        else {
            tracing::debug!("JustWatch: no results for '{}'", title);
            return Ok(None);
        };

        // A title without any offer at all is treated as not found
        if node.offers.is_empty() {
            tracing::debug!("JustWatch: '{}' has no offers", node.content.title);
            return Ok(None);
        }

        tracing::debug!(
            "JustWatch: '{}' -> '{}' ({:?} {:?}, {} offers)",
            title,
            node.content.title,
            node.object_type,
            node.content.original_release_year,
            node.offers.len()
        );

        Ok(Some(to_matched_show(node, providers)))
    }
}

fn to_matched_show(node: TitleNode, providers: &[Provider]) -> MatchedShow {
    let monitored: HashSet<ProviderId> = providers.iter().map(|p| p.id).collect();

    let offers = node
        .offers
        .into_iter()
        .filter(|offer| monitored.contains(&ProviderId(offer.package.package_id)))
        .map(|offer| Offer {
            provider_id: ProviderId(offer.package.package_id),
            monetization_kind: offer.monetization_type,
            provider_short_name: offer.package.short_name,
            provider_clear_name: offer.package.clear_name,
        })
        .collect::<Vec<_>>();

    for offer in &offers {
        tracing::debug!(
            "JustWatch: '{}' on {} ({}, {})",
            node.content.title,
            offer.provider_clear_name,
            offer.provider_short_name,
            offer.monetization_kind
        );
    }

    MatchedShow {
        title: node.content.title,
        external_id: node.object_id.to_string(),
        offers,
    }
}
