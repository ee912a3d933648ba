//! tree-sitter helpers for YAML parsers
//!
//! YAML tree structure for a block mapping:
//! ```text
//! stream
//!   document
//!     block_node
//!       block_mapping
//!         block_mapping_pair        <- "charts: ..."
//!           flow_node               <- key
//!           block_node              <- value (nested mapping or sequence)
//!         block_mapping_pair        <- "appVersion: 2024.2.1"
//!           flow_node               <- key
//!           flow_node               <- value (scalar)
//! ```

use tracing::warn;

use crate::parser::traits::ParseError;

/// Parse YAML content into a syntax tree
pub fn parse_yaml(content: &str) -> Result<tree_sitter::Tree, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    let language = tree_sitter_yaml::LANGUAGE;
    parser.set_language(&language.into()).map_err(|e| {
        warn!("Failed to set YAML language for tree-sitter: {}", e);
        ParseError::TreeSitter(e.to_string())
    })?;

    parser.parse(content, None).ok_or_else(|| {
        warn!("Failed to parse YAML content");
        ParseError::ParseFailed("Failed to parse YAML".to_string())
    })
}

/// Text of a node with surrounding whitespace and quotes removed
pub fn node_text(node: tree_sitter::Node, content: &str) -> String {
    content[node.byte_range()]
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}

/// Line and column (0-indexed) of a scalar value, skipping an opening quote
pub fn value_position(node: tree_sitter::Node, content: &str) -> (usize, usize) {
    let point = node.start_position();
    let quoted = content[node.byte_range()].starts_with(['"', '\'']);
    (point.row, point.column + usize::from(quoted))
}

/// First `block_mapping` at or below `node`, in document order
pub fn first_block_mapping(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.kind() == "block_mapping" {
        return Some(node);
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_block_mapping)
}

/// Direct `key: value` pairs of a `block_mapping`
pub fn mapping_pairs<'tree>(
    mapping: tree_sitter::Node<'tree>,
    content: &str,
) -> Vec<(String, tree_sitter::Node<'tree>)> {
    let mut cursor = mapping.walk();
    mapping
        .children(&mut cursor)
        .filter(|child| child.kind() == "block_mapping_pair")
        .filter_map(|pair| {
            let key = pair.child_by_field_name("key")?;
            let value = pair.child_by_field_name("value")?;
            Some((node_text(key, content), value))
        })
        .collect()
}

/// Value of the first pair named `key` at or below `node`
pub fn find_pair_value<'tree>(
    node: tree_sitter::Node<'tree>,
    content: &str,
    key: &str,
) -> Option<tree_sitter::Node<'tree>> {
    if node.kind() == "block_mapping_pair"
        && let Some(key_node) = node.child_by_field_name("key")
        && node_text(key_node, content) == key
    {
        return node.child_by_field_name("value");
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| find_pair_value(child, content, key))
}

/// Every `block_mapping` below `node` that is not nested in another one
pub fn outermost_block_mappings<'tree>(
    node: tree_sitter::Node<'tree>,
    results: &mut Vec<tree_sitter::Node<'tree>>,
) {
    if node.kind() == "block_mapping" {
        results.push(node);
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        outermost_block_mappings(child, results);
    }
}
