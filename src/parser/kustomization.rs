//! Kustomize image override parser
//!
//! Format:
//! ```yaml
//! images:
//!   - name: ghcr.io/rackerlabs/genestack-images/nova
//!     newTag: 2024.1-latest
//! ```

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DetectedVersion, match_component};
use crate::parser::yaml::{
    find_pair_value, mapping_pairs, node_text, outermost_block_mappings, parse_yaml, value_position,
};

/// Parser for kustomization.yaml files
pub struct KustomizationParser;

impl KustomizationParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KustomizationParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for KustomizationParser {
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError> {
        let tree = parse_yaml(content)?;

        let Some(images) = find_pair_value(tree.root_node(), content, "images") else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        outermost_block_mappings(images, &mut entries);

        let results = entries
            .into_iter()
            .filter_map(|entry| {
                let pairs = mapping_pairs(entry, content);
                let text_of = |name: &str| {
                    pairs
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| node_text(*value, content))
                };

                let component = text_of("name")
                    .and_then(|name| match_component(&name))
                    .or_else(|| text_of("newName").and_then(|name| match_component(&name)))?;

                let (_, tag_node) = pairs.iter().find(|(key, _)| key == "newTag")?;
                let tag = node_text(*tag_node, content);
                if tag.is_empty() {
                    return None;
                }

                let (line, column) = value_position(*tag_node, content);
                Some(DetectedVersion::new(component, &tag, line, column))
            })
            .collect();

        Ok(results)
    }
}
