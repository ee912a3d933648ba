//! Version tag resolution
//!
//! Extracts the leading date-coded series from a free-form tag and names it.
//!
//! Examples:
//! - `2024.2.396+gfd123-628a320c` -> `2024.2`, Dalmatian, `dalmatian v2.396`
//! - `2025.1` -> `2025.1`, Epoxy, `epoxy v1`
//! - `2024.1-latest` -> `2024.1`, Caracal, `caracal v1`

use regex::Regex;
use serde::Serialize;

use crate::release::catalog::ReleaseCatalog;

/// Release name used when a series is not in any table
pub const UNKNOWN_RELEASE: &str = "Unknown";

/// A version tag resolved to its release series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    /// Version without build metadata (e.g., "2024.2.396")
    pub full_version: String,
    /// Year and minor (e.g., "2024.2")
    pub numeric_series: String,
    /// Release name (e.g., "Dalmatian"), or [`UNKNOWN_RELEASE`]
    pub release_name: String,
    /// Human-readable label (e.g., "dalmatian v2.396")
    pub formatted_label: String,
}

impl ResolvedVersion {
    /// Whether the series mapped to a named release
    pub fn is_known(&self) -> bool {
        self.release_name != UNKNOWN_RELEASE
    }
}

/// Resolves raw tags against a release catalog
pub struct VersionResolver {
    catalog: ReleaseCatalog,
    /// Leading `YYYY.N[.PATCH]`
    series_re: Regex,
    /// Trailing `+<hex>-<sha>` build metadata
    commit_re: Regex,
}

impl VersionResolver {
    pub fn new(catalog: ReleaseCatalog) -> Self {
        Self {
            catalog,
            series_re: Regex::new(r"^\s*(\d{4})\.(\d+)(?:\.(\d+))?").unwrap(),
            commit_re: Regex::new(r"\+g?[0-9a-f]{5,16}-([0-9a-f]{7,40})$").unwrap(),
        }
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    /// Resolve a tag, or `None` if it carries no date-coded series
    pub fn resolve(&self, tag: &str) -> Option<ResolvedVersion> {
        let caps = self.series_re.captures(tag)?;
        let year = caps.get(1)?.as_str();
        let minor = caps.get(2)?.as_str();
        let patch = caps.get(3).map(|m| m.as_str());

        let numeric_series = format!("{}.{}", year, minor);
        let full_version = match patch {
            Some(patch) => format!("{}.{}", numeric_series, patch),
            None => numeric_series.clone(),
        };

        let release_name = self
            .catalog
            .lookup(&numeric_series)
            .map(|info| info.name)
            .unwrap_or_else(|| UNKNOWN_RELEASE.to_string());

        let label_name = release_name.to_lowercase();
        let formatted_label = match patch {
            Some(patch) => format!("{} v{}.{}", label_name, minor, patch),
            None => format!("{} v{}", label_name, minor),
        };

        Some(ResolvedVersion {
            full_version,
            numeric_series,
            release_name,
            formatted_label,
        })
    }

    /// Upstream commit SHA embedded in the tag's build metadata, if any
    pub fn extract_commit_sha(&self, tag: &str) -> Option<String> {
        self.commit_re
            .captures(tag.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Major version of a semver-style upstream version (`30.1.0`, `v29.2`).
///
/// Date-coded versions (`2024.2.1`) carry no upstream major and yield `None`.
pub fn upstream_major(version: &str) -> Option<u64> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let (major, rest) = version.split_once('.')?;
    if major.len() > 3 || !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    major.parse().ok()
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new(ReleaseCatalog::builtin())
    }
}
