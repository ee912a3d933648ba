//! helm-chart-versions.yaml parser
//!
//! Format:
//! ```yaml
//! charts:
//!   nova: 2024.2.396+gfd123-628a320c
//!   neutron: "2024.2.12"
//!   mariadb-operator: 0.38.1   # not a tracked component, skipped
//! ```

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DetectedVersion, match_component};
use crate::parser::yaml::{
    find_pair_value, first_block_mapping, mapping_pairs, node_text, parse_yaml, value_position,
};

/// Parser for helm-chart-versions.yaml files
pub struct ChartVersionsParser;

impl ChartVersionsParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChartVersionsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ChartVersionsParser {
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError> {
        let tree = parse_yaml(content)?;

        let Some(charts) = find_pair_value(tree.root_node(), content, "charts")
            .and_then(first_block_mapping)
        else {
            return Ok(Vec::new());
        };

        let results = mapping_pairs(charts, content)
            .into_iter()
            .filter_map(|(chart, value)| {
                let component = match_component(&chart)?;
                let version = node_text(value, content);
                if version.is_empty() {
                    return None;
                }
                let (line, column) = value_position(value, content);
                Some(DetectedVersion::new(component, &version, line, column))
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_tracked_charts() {
        let parser = ChartVersionsParser::new();
        let content = r#"charts:
  nova: 2024.2.396+gfd123-628a320c
  neutron: "2024.2.12"
  mariadb-operator: 0.38.1
"#;
        let result = parser.parse(content).unwrap();

        assert_eq!(
            result,
            vec![
                DetectedVersion::new("nova", "2024.2.396+gfd123-628a320c", 1, 8),
                DetectedVersion::new("neutron", "2024.2.12", 2, 12),
            ]
        );
    }

    #[test]
    fn parse_maps_prefixed_chart_names_to_component() {
        let parser = ChartVersionsParser::new();
        let content = r#"charts:
  openstack-keystone: 2024.1.4
"#;
        let result = parser.parse(content).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].component, "keystone");
        assert_eq!(result[0].version, "2024.1.4");
    }

    #[test]
    fn parse_returns_empty_without_charts_key() {
        let parser = ChartVersionsParser::new();
        let content = r#"images:
  nova: 2024.2.1
"#;
        assert!(parser.parse(content).unwrap().is_empty());
    }

    #[test]
    fn parse_skips_empty_values() {
        let parser = ChartVersionsParser::new();
        let content = r#"charts:
  nova: ""
  glance: 2025.1.1
"#;
        let result = parser.parse(content).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].component, "glance");
    }
}
