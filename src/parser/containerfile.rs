//! Dockerfile / Containerfile parser
//!
//! Format examples:
//! - `FROM ghcr.io/rackerlabs/genestack/nova:2024.1-latest AS base`
//! - `ARG KEYSTONE_VERSION=2024.2.1`

use regex::Regex;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DetectedVersion, match_component};

/// Parser for Dockerfile and Containerfile files
pub struct ContainerfileParser {
    /// Regex for base images: `FROM [--platform=...] image:tag`
    from_re: Regex,
    /// Regex for build arguments: `ARG COMPONENT_VERSION=tag`
    arg_re: Regex,
}

impl ContainerfileParser {
    pub fn new() -> Self {
        Self {
            from_re: Regex::new(r"(?i)^\s*FROM\s+(?:--platform=\S+\s+)?([^\s@]+):([^\s:@/]+)(?:[\s@]|$)")
                .unwrap(),
            arg_re: Regex::new(r#"(?i)^\s*(?:ARG|ENV)\s+(\w+?)_VERSION[=\s]+["']?([^"'\s]+)"#)
                .unwrap(),
        }
    }
}

impl Default for ContainerfileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ContainerfileParser {
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError> {
        let mut results = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }

            let caps = self
                .from_re
                .captures(line)
                .or_else(|| self.arg_re.captures(line));
            let Some(caps) = caps else {
                continue;
            };

            let (Some(subject), Some(tag)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Some(component) = match_component(subject.as_str()) {
                results.push(DetectedVersion::new(
                    component,
                    tag.as_str(),
                    line_num,
                    tag.start(),
                ));
            }
        }

        Ok(results)
    }
}
