//! Parser trait definition

use crate::parser::types::DetectedVersion;

/// Trait for extracting component versions from a configuration file
pub trait Parser: Send + Sync {
    /// Parse the content and extract component versions
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError>;
}

/// Error type for parsing operations
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse the file structure
    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    /// Tree-sitter related error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}
