//! Upstream lookups through the GitHub REST API
//!
//! Two uses: pin each deployed commit to the upstream tag it was built from,
//! and turn a "unify to release X" recommendation into a concrete upstream
//! version for each mismatched component.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use semver::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{FETCH_STAGGER_DELAY_MS, MAX_TAG_DATE_LOOKUPS, TAGS_PER_PAGE};
use crate::release::catalog::{
    builtin_release, expected_major, release_notes_url, series_for_major,
};
use crate::release::classifier::{Alignment, DominantRelease};
use crate::release::error::ForgeError;
use crate::release::resolver::upstream_major;
use crate::release::types::{ComponentRecord, UpstreamVersion};

/// A tag and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub commit_sha: String,
}

impl TagRef {
    pub fn new(name: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_sha: commit_sha.into(),
        }
    }
}

/// A commit with its date and parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full SHA
    pub sha: String,
    pub committed_at: DateTime<Utc>,
    pub parents: Vec<String>,
}

/// Trait for listing the tags of an upstream repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagSource: Send + Sync {
    /// Fetches all tags of `repository`, in the order the forge returns them
    async fn fetch_tags(&self, repository: &str) -> Result<Vec<TagRef>, ForgeError>;
}

/// Trait for looking up single commits of an upstream repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CommitSource: Send + Sync {
    /// Fetches the commit `sha` (full or abbreviated) of `repository`
    async fn fetch_commit(&self, repository: &str, sha: &str) -> Result<CommitInfo, ForgeError>;
}

/// Response item from the GitHub tags API
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    commit: ShaRef,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

/// Response from the GitHub commits API
#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
    commit: CommitDetail,
    #[serde(default)]
    parents: Vec<ShaRef>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Signature,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

/// Tag and commit source backed by the GitHub REST API
pub struct GitHubForge {
    client: reqwest::Client,
    base_url: String,
    organization: String,
    token: Option<String>,
    per_page: usize,
}

impl GitHubForge {
    pub fn new(
        base_url: &str,
        organization: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ForgeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("release-align/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            token,
            per_page: TAGS_PER_PAGE,
        })
    }

    /// Override the page size (mainly for tests)
    pub fn with_page_size(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// GET `{base_url}/repos/{organization}/{path}` and decode the JSON body
    async fn get<T: DeserializeOwned>(&self, repository: &str, path: &str) -> Result<T, ForgeError> {
        let url = format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.organization, repository, path
        );

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ForgeError::NotFound(format!(
                "{}/{}/{}",
                self.organization, repository, path
            )));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ForgeError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(ForgeError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub response from {}: {}", url, e);
            ForgeError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl TagSource for GitHubForge {
    async fn fetch_tags(&self, repository: &str) -> Result<Vec<TagRef>, ForgeError> {
        let mut tags = Vec::new();

        for page in 1.. {
            let path = format!("tags?per_page={}&page={}", self.per_page, page);
            let page_tags: Vec<Tag> = self.get(repository, &path).await?;
            let page_len = page_tags.len();
            tags.extend(
                page_tags
                    .into_iter()
                    .map(|tag| TagRef::new(tag.name, tag.commit.sha)),
            );

            if page_len < self.per_page {
                break;
            }
        }

        debug!("Fetched {} tags for {}", tags.len(), repository);
        Ok(tags)
    }
}

#[async_trait::async_trait]
impl CommitSource for GitHubForge {
    async fn fetch_commit(&self, repository: &str, sha: &str) -> Result<CommitInfo, ForgeError> {
        let commit: Commit = self.get(repository, &format!("commits/{}", sha)).await?;

        Ok(CommitInfo {
            sha: commit.sha,
            committed_at: commit.commit.committer.date,
            parents: commit.parents.into_iter().map(|parent| parent.sha).collect(),
        })
    }
}

/// Browser links to upstream repositories
#[derive(Debug, Clone)]
pub struct ForgeLinks {
    web_url: String,
    organization: String,
}

impl ForgeLinks {
    pub fn new(web_url: &str, organization: &str) -> Self {
        Self {
            web_url: web_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
        }
    }

    pub fn commit_url(&self, repository: &str, sha: &str) -> String {
        format!(
            "{}/{}/{}/commit/{}",
            self.web_url, self.organization, repository, sha
        )
    }

    pub fn tag_url(&self, repository: &str, tag: &str) -> String {
        format!(
            "{}/{}/{}/releases/tag/{}",
            self.web_url, self.organization, repository, tag
        )
    }
}

/// Tag found for a deployed commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch<'a> {
    pub tag: &'a TagRef,
    /// Full SHA of the deployed commit, when known
    pub commit_sha: String,
    /// The tag points at the deployed commit itself
    pub exact: bool,
}

/// Whether two SHAs name the same commit; either may be abbreviated
fn same_commit(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
    !a.is_empty() && !b.is_empty() && (a.starts_with(&b) || b.starts_with(&a))
}

fn stable_version(tag: &str) -> Option<Version> {
    let stripped = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(stripped)
        .ok()
        .filter(|version| version.pre.is_empty())
}

/// Find the upstream tag a deployed commit was built from.
///
/// Tried in order:
/// 1. a tag pointing at the commit itself
/// 2. a tag pointing at one of its parents
/// 3. among the newest stable tags (restricted to `expected_major` when
///    given), the one committed last at or before the deployed commit
///
/// Step 3 fetches at most [`MAX_TAG_DATE_LOOKUPS`] tag commits.
pub async fn find_upstream_tag<'a>(
    repository: &str,
    sha: &str,
    tags: &'a [TagRef],
    expected_major: Option<u64>,
    commits: &dyn CommitSource,
) -> Result<Option<TagMatch<'a>>, ForgeError> {
    if let Some(tag) = tags.iter().find(|tag| same_commit(&tag.commit_sha, sha)) {
        return Ok(Some(TagMatch {
            tag,
            commit_sha: tag.commit_sha.clone(),
            exact: true,
        }));
    }

    let commit = commits.fetch_commit(repository, sha).await?;

    if let Some(tag) = tags.iter().find(|tag| {
        commit
            .parents
            .iter()
            .any(|parent| same_commit(&tag.commit_sha, parent))
    }) {
        return Ok(Some(TagMatch {
            tag,
            commit_sha: commit.sha,
            exact: false,
        }));
    }

    let mut candidates: Vec<(&TagRef, Version)> = tags
        .iter()
        .filter_map(|tag| stable_version(&tag.name).map(|version| (tag, version)))
        .filter(|(_, version)| expected_major.is_none_or(|major| version.major == major))
        .collect();
    candidates.sort_by(|(_, a), (_, b)| b.cmp(a));

    let mut best: Option<(&TagRef, DateTime<Utc>)> = None;
    for (tag, _) in candidates.into_iter().take(MAX_TAG_DATE_LOOKUPS) {
        let tagged = commits.fetch_commit(repository, &tag.commit_sha).await?;
        if tagged.committed_at <= commit.committed_at
            && best.is_none_or(|(_, at)| tagged.committed_at > at)
        {
            best = Some((tag, tagged.committed_at));
        }
    }

    Ok(best.map(|(tag, _)| TagMatch {
        tag,
        commit_sha: commit.sha,
        exact: false,
    }))
}

/// Pin every record carrying a commit SHA to its upstream tag.
///
/// Tags are fetched once per component, concurrently with staggered start
/// times. Records whose tags or commit cannot be fetched keep no upstream
/// version. Returns the number of records resolved.
pub async fn resolve_upstream_versions(
    records: &mut [ComponentRecord],
    tags: &dyn TagSource,
    commits: &dyn CommitSource,
    links: &ForgeLinks,
) -> usize {
    let components: BTreeSet<String> = records
        .iter()
        .filter(|record| record.commit_sha.is_some())
        .map(|record| record.component.to_ascii_lowercase())
        .collect();

    let fetched = fetch_all_tags(components, tags).await;

    let mut resolved = 0;
    for record in records.iter_mut() {
        let Some(sha) = record.commit_sha.clone() else {
            continue;
        };
        let component = record.component.to_ascii_lowercase();
        let Some(component_tags) = fetched.get(&component) else {
            continue;
        };
        let expected = record
            .numeric_series()
            .and_then(|series| expected_major(series, &component));

        match find_upstream_tag(&component, &sha, component_tags, expected, commits).await {
            Ok(Some(found)) => {
                record.upstream = Some(upstream_version(&component, found, links));
                resolved += 1;
            }
            Ok(None) => debug!("No upstream tag precedes {} commit {}", component, sha),
            Err(e) => warn!("Failed to resolve {} commit {}: {}", component, sha, e),
        }
    }

    info!("Resolved upstream tags for {} deployed commits", resolved);
    resolved
}

fn upstream_version(component: &str, found: TagMatch<'_>, links: &ForgeLinks) -> UpstreamVersion {
    let series = upstream_major(&found.tag.name)
        .and_then(|major| series_for_major(component, major));
    let release_name = series
        .and_then(builtin_release)
        .map(|info| info.name);

    UpstreamVersion {
        tag: found.tag.name.clone(),
        commit_url: links.commit_url(component, &found.commit_sha),
        tag_url: links.tag_url(component, &found.tag.name),
        release_notes_url: release_name.as_deref().map(release_notes_url),
        commit_sha: found.commit_sha,
        exact: found.exact,
        series: series.map(String::from),
        release_name,
    }
}

/// Fetch tags per component with staggered start times, dropping failures
async fn fetch_all_tags(
    components: BTreeSet<String>,
    source: &dyn TagSource,
) -> HashMap<String, Vec<TagRef>> {
    let futures = components.into_iter().enumerate().map(|(i, component)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            let tags = source
                .fetch_tags(&component)
                .await
                .inspect_err(|e| warn!("Failed to fetch tags for {}: {}", component, e))
                .ok();
            (component, tags)
        }
    });

    join_all(futures)
        .await
        .into_iter()
        .filter_map(|(component, tags)| tags.map(|tags| (component, tags)))
        .collect()
}

/// Highest stable tag whose semver major equals `expected_major`.
///
/// Tags may carry a `v` prefix; tags that are not valid semver are skipped.
pub fn recommend_tag(tags: &[TagRef], expected_major: u64) -> Option<String> {
    tags.iter()
        .filter_map(|tag| stable_version(&tag.name).map(|parsed| (tag, parsed)))
        .filter(|(_, parsed)| parsed.major == expected_major)
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(tag, _)| tag.name.clone())
}

/// Replace the recommendation of each mismatched record with a concrete
/// upstream tag from the dominant release.
///
/// Tags are fetched once per component, concurrently with staggered start
/// times. Components without a known expected major, or whose fetch fails,
/// keep the classifier's recommendation. Returns the number of records updated.
pub async fn recommend_versions(
    records: &mut [ComponentRecord],
    source: &dyn TagSource,
    dominant: &DominantRelease,
) -> usize {
    let components: BTreeSet<String> = records
        .iter()
        .filter(|record| is_mismatch(record))
        .map(|record| record.component.to_ascii_lowercase())
        .filter(|component| {
            let known = expected_major(&dominant.series, component).is_some();
            if !known {
                debug!(
                    "No expected major for {} in {}, skipping tag lookup",
                    component, dominant.series
                );
            }
            known
        })
        .collect();

    let fetched = fetch_all_tags(components, source).await;

    let mut updated = 0;
    for record in records.iter_mut().filter(|record| is_mismatch(record)) {
        let component = record.component.to_ascii_lowercase();
        let Some(major) = expected_major(&dominant.series, &component) else {
            continue;
        };
        let Some(tag) = fetched
            .get(&component)
            .and_then(|tags| recommend_tag(tags, major))
        else {
            continue;
        };

        record.recommendation = Some(format!("{} ({})", tag, dominant.name));
        updated += 1;
    }

    info!("Resolved upstream tags for {} mismatched records", updated);
    updated
}

fn is_mismatch(record: &ComponentRecord) -> bool {
    record
        .status
        .as_ref()
        .is_some_and(|status| status.alignment == Alignment::Mismatch)
}
