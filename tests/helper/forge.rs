//! Forge test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use release_align::release::error::ForgeError;
use release_align::release::forge::{CommitInfo, CommitSource, TagRef, TagSource};

/// In-memory tags and commits keyed by repository name
#[derive(Default)]
pub struct StaticForge {
    tags: HashMap<String, Vec<TagRef>>,
    commits: HashMap<String, Vec<CommitInfo>>,
}

impl StaticForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags whose commits are never looked up
    pub fn with_tags(mut self, repository: &str, tags: &[&str]) -> Self {
        let entry = self.tags.entry(repository.to_string()).or_default();
        entry.extend(tags.iter().map(|tag| TagRef::new(*tag, format!("untracked-{}", tag))));
        self
    }

    pub fn with_tag(mut self, repository: &str, tag: &str, sha: &str) -> Self {
        self.tags
            .entry(repository.to_string())
            .or_default()
            .push(TagRef::new(tag, sha));
        self
    }

    pub fn with_commit(mut self, repository: &str, sha: &str, committed_at: &str) -> Self {
        self.commits
            .entry(repository.to_string())
            .or_default()
            .push(CommitInfo {
                sha: sha.to_string(),
                committed_at: committed_at.parse().unwrap(),
                parents: Vec::new(),
            });
        self
    }
}

#[async_trait]
impl TagSource for StaticForge {
    async fn fetch_tags(&self, repository: &str) -> Result<Vec<TagRef>, ForgeError> {
        self.tags
            .get(repository)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(repository.to_string()))
    }
}

#[async_trait]
impl CommitSource for StaticForge {
    async fn fetch_commit(&self, repository: &str, sha: &str) -> Result<CommitInfo, ForgeError> {
        self.commits
            .get(repository)
            .and_then(|commits| commits.iter().find(|commit| commit.sha.starts_with(sha)))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("{}@{}", repository, sha)))
    }
}
