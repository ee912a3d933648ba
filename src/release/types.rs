//! Component records produced by a scan

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::release::classifier::CompatibilityStatus;
use crate::release::resolver::{ResolvedVersion, VersionResolver};

/// Where a version string was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// Path relative to the scanned root
    pub path: PathBuf,
    /// Line number (0-indexed)
    pub line: usize,
    /// Byte column of the version within the line (0-indexed)
    pub column: usize,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.line + 1,
            self.column + 1
        )
    }
}

/// Upstream release tag containing a deployed commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamVersion {
    /// Tag name as published (e.g., "30.1.0")
    pub tag: String,
    /// Full SHA of the deployed commit
    pub commit_sha: String,
    /// Whether the tag points at the deployed commit itself
    pub exact: bool,
    /// Release series the tag's major version belongs to
    pub series: Option<String>,
    pub release_name: Option<String>,
    pub commit_url: String,
    pub tag_url: String,
    pub release_notes_url: Option<String>,
}

/// A detected component version and its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRecord {
    /// Component name (e.g., "nova")
    pub component: String,
    /// First location the version was found at
    pub source: SourceLocation,
    /// Other files carrying the same component version
    pub additional_sources: Vec<PathBuf>,
    /// Version string as written in the source file
    pub detected_version: String,
    /// Resolution of `detected_version`, `None` when it carries no series
    pub resolved: Option<ResolvedVersion>,
    /// Upstream commit SHA from the build metadata, if present
    pub commit_sha: Option<String>,
    /// Upstream tag resolved from `commit_sha` through the forge
    pub upstream: Option<UpstreamVersion>,
    /// Filled in by the classifier once the whole batch is known
    pub status: Option<CompatibilityStatus>,
    pub recommendation: Option<String>,
}

impl ComponentRecord {
    /// Build an unclassified record, resolving `detected_version` with `resolver`
    pub fn new(
        component: impl Into<String>,
        source: SourceLocation,
        detected_version: impl Into<String>,
        resolver: &VersionResolver,
    ) -> Self {
        let detected_version = detected_version.into();
        let resolved = resolver.resolve(&detected_version);
        let commit_sha = resolver.extract_commit_sha(&detected_version);

        Self {
            component: component.into(),
            source,
            additional_sources: Vec::new(),
            detected_version,
            resolved,
            commit_sha,
            upstream: None,
            status: None,
            recommendation: None,
        }
    }

    /// Release name when the version mapped to a known release
    pub fn release_name(&self) -> Option<&str> {
        self.resolved
            .as_ref()
            .filter(|resolved| resolved.is_known())
            .map(|resolved| resolved.release_name.as_str())
    }

    /// Numeric series, known release or not
    pub fn numeric_series(&self) -> Option<&str> {
        self.resolved
            .as_ref()
            .map(|resolved| resolved.numeric_series.as_str())
    }
}
