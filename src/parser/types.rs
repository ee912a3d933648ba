//! Common types for parsers

/// Upstream components whose versions are tracked
pub const KNOWN_COMPONENTS: &[&str] = &[
    "keystone",
    "nova",
    "neutron",
    "glance",
    "cinder",
    "placement",
    "heat",
    "barbican",
    "octavia",
    "magnum",
    "masakari",
    "ceilometer",
    "gnocchi",
    "cloudkitty",
    "ironic",
    "designate",
    "zaqar",
    "blazar",
    "freezer",
    "horizon",
    "skyline",
];

/// First known component mentioned in `text` (case-insensitive)
pub fn match_component(text: &str) -> Option<&'static str> {
    let lowered = text.to_ascii_lowercase();
    KNOWN_COMPONENTS
        .iter()
        .copied()
        .find(|component| lowered.contains(component))
}

/// Kind of configuration file a version may be scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// helm-chart-versions.yaml (chart name -> version map)
    ChartVersions,
    /// Helm Chart.yaml
    ChartManifest,
    /// kustomization.yaml
    Kustomization,
    /// Dockerfile / Containerfile
    Containerfile,
    /// Any other YAML file (values, overrides, manifests, workflows)
    Manifest,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ChartVersions => "chart_versions",
            SourceKind::ChartManifest => "chart_manifest",
            SourceKind::Kustomization => "kustomization",
            SourceKind::Containerfile => "containerfile",
            SourceKind::Manifest => "manifest",
        }
    }
}

/// Detect the source kind from a file path
pub fn detect_source_kind(path: &str) -> Option<SourceKind> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);

    if matches!(
        file_name,
        "helm-chart-versions.yaml" | "helm-chart-versions.yml"
    ) {
        Some(SourceKind::ChartVersions)
    } else if file_name == "Chart.yaml" {
        Some(SourceKind::ChartManifest)
    } else if matches!(
        file_name,
        "kustomization.yaml" | "kustomization.yml" | "Kustomization"
    ) {
        Some(SourceKind::Kustomization)
    } else if is_containerfile(file_name) {
        Some(SourceKind::Containerfile)
    } else if file_name.ends_with(".yaml") || file_name.ends_with(".yml") {
        Some(SourceKind::Manifest)
    } else {
        None
    }
}

fn is_containerfile(file_name: &str) -> bool {
    ["Dockerfile", "Containerfile"].iter().any(|base| {
        file_name == *base
            || file_name
                .strip_prefix(base)
                .is_some_and(|rest| rest.starts_with('.'))
    }) || file_name.ends_with(".dockerfile")
        || file_name.ends_with(".containerfile")
}

/// A component version found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedVersion {
    /// Component name (e.g., "nova")
    pub component: String,
    /// Version string as written (e.g., "2024.1-latest")
    pub version: String,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

impl DetectedVersion {
    pub fn new(component: &str, version: &str, line: usize, column: usize) -> Self {
        Self {
            component: component.to_string(),
            version: version.to_string(),
            line,
            column,
        }
    }
}
