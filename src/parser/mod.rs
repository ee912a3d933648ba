//! Parser layer
//! - traits.rs: Parser trait definition
//! - types.rs: Common types (DetectedVersion, SourceKind, known components)
//! - yaml.rs: tree-sitter helpers shared by the YAML parsers
//! - chart_manifest.rs: Helm Chart.yaml parser
//! - chart_versions.rs: helm-chart-versions.yaml parser
//! - kustomization.rs: Kustomize image override parser
//! - containerfile.rs: Dockerfile / Containerfile parser
//! - component_line.rs: line-pattern parser for other YAML manifests

pub mod chart_manifest;
pub mod chart_versions;
pub mod component_line;
pub mod containerfile;
pub mod kustomization;
pub mod traits;
pub mod types;
pub mod yaml;

use std::collections::HashMap;

pub use chart_manifest::ChartManifestParser;
pub use chart_versions::ChartVersionsParser;
pub use component_line::ComponentLineParser;
pub use containerfile::ContainerfileParser;
pub use kustomization::KustomizationParser;
pub use traits::{ParseError, Parser};
pub use types::{DetectedVersion, SourceKind};

/// Create one parser per source kind
pub fn create_default_parsers() -> HashMap<SourceKind, Box<dyn Parser>> {
    let mut parsers: HashMap<SourceKind, Box<dyn Parser>> = HashMap::new();

    parsers.insert(SourceKind::ChartVersions, Box::new(ChartVersionsParser::new()));
    parsers.insert(SourceKind::ChartManifest, Box::new(ChartManifestParser::new()));
    parsers.insert(SourceKind::Kustomization, Box::new(KustomizationParser::new()));
    parsers.insert(SourceKind::Containerfile, Box::new(ContainerfileParser::new()));
    parsers.insert(SourceKind::Manifest, Box::new(ComponentLineParser::new()));

    parsers
}
