//! Helm Chart.yaml parser
//!
//! The chart name identifies the component; the version comes from
//! `appVersion`, or from `version` when it is release-coded (`YYYY.N...`).

use regex::Regex;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DetectedVersion, match_component};
use crate::parser::yaml::{first_block_mapping, mapping_pairs, node_text, parse_yaml, value_position};

/// Parser for Helm Chart.yaml files
pub struct ChartManifestParser {
    /// Release-coded chart version: `2024.2.1`
    release_coded_re: Regex,
}

impl ChartManifestParser {
    pub fn new() -> Self {
        Self {
            release_coded_re: Regex::new(r"^\d{4}\.\d").unwrap(),
        }
    }
}

impl Default for ChartManifestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ChartManifestParser {
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError> {
        let tree = parse_yaml(content)?;

        let Some(mapping) = first_block_mapping(tree.root_node()) else {
            return Ok(Vec::new());
        };
        let pairs = mapping_pairs(mapping, content);

        let field = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| (node_text(*value, content), *value))
                .filter(|(text, _)| !text.is_empty())
        };

        let Some(component) = field("name").and_then(|(name, _)| match_component(&name)) else {
            return Ok(Vec::new());
        };

        let version = field("appVersion").or_else(|| {
            field("version").filter(|(text, _)| self.release_coded_re.is_match(text))
        });

        Ok(version
            .map(|(text, node)| {
                let (line, column) = value_position(node, content);
                DetectedVersion::new(component, &text, line, column)
            })
            .into_iter()
            .collect())
    }
}
