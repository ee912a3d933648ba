//! Remote release catalog refresh

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::release::catalog::{ReleaseCatalog, ReleaseInfo, ReleaseStatus};
use crate::release::error::CatalogError;

/// Trait for fetching a release catalog from a remote source
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<ReleaseCatalog, CatalogError>;
}

/// One series entry of the releases metadata document
#[derive(Debug, Deserialize)]
struct SeriesEntry {
    #[serde(default)]
    releases: Vec<SeriesRelease>,
}

#[derive(Debug, Deserialize)]
struct SeriesRelease {
    #[serde(default)]
    version: String,
    #[serde(default)]
    status: Option<String>,
}

/// Catalog source reading the official releases metadata JSON
pub struct ReleasesSiteSource {
    client: reqwest::Client,
    url: String,
}

impl ReleasesSiteSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("release-align/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl CatalogSource for ReleasesSiteSource {
    async fn fetch_catalog(&self) -> Result<ReleaseCatalog, CatalogError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Release metadata returned status {}: {}", status, self.url);
            return Err(CatalogError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let document: IndexMap<String, SeriesEntry> = response.json().await.map_err(|e| {
            warn!("Failed to parse release metadata: {}", e);
            CatalogError::InvalidResponse(e.to_string())
        })?;

        Ok(catalog_from_document(document))
    }
}

/// Build a catalog keyed by numeric series; the last release of each series wins
fn catalog_from_document(document: IndexMap<String, SeriesEntry>) -> ReleaseCatalog {
    document
        .into_iter()
        .filter_map(|(name, entry)| {
            let latest = entry.releases.into_iter().last()?;
            if latest.version.is_empty() {
                return None;
            }
            let status = latest
                .status
                .as_deref()
                .map(ReleaseStatus::parse)
                .unwrap_or(ReleaseStatus::Unknown);
            Some((latest.version, ReleaseInfo::new(title_case(&name), status)))
        })
        .collect()
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Load the catalog for a scan.
///
/// Without a source, or when the source fails or returns nothing, the
/// built-in table is used. Failures are logged, never returned.
pub async fn load_catalog(source: Option<&dyn CatalogSource>) -> ReleaseCatalog {
    let Some(source) = source else {
        return ReleaseCatalog::builtin();
    };

    match source.fetch_catalog().await {
        Ok(catalog) if !catalog.is_empty() => {
            info!("Loaded {} release series from remote catalog", catalog.len());
            catalog
        }
        Ok(_) => {
            warn!("Remote catalog was empty, using built-in release table");
            ReleaseCatalog::builtin()
        }
        Err(e) => {
            warn!("Failed to refresh release catalog, using built-in table: {}", e);
            ReleaseCatalog::builtin()
        }
    }
}
