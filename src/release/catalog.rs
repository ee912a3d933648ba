//! Release series catalog
//!
//! Maps a numeric series (`2024.2`) to its release name and support status.
//! A catalog may be refreshed from remote metadata; lookups that miss the
//! loaded catalog fall back to the built-in table.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::RELEASE_NOTES_URL;

/// Support status of a release series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReleaseStatus {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "maintained")]
    Maintained,
    #[serde(rename = "EOL")]
    EndOfLife,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Current => "current",
            ReleaseStatus::Maintained => "maintained",
            ReleaseStatus::EndOfLife => "EOL",
            ReleaseStatus::Unknown => "unknown",
        }
    }

    /// Parse a status label as published in release metadata.
    ///
    /// Unrecognized labels map to [`ReleaseStatus::Unknown`].
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "current" | "development" => ReleaseStatus::Current,
            "maintained" | "stable" => ReleaseStatus::Maintained,
            "eol" | "end-of-life" | "end of life" | "unmaintained" => ReleaseStatus::EndOfLife,
            _ => ReleaseStatus::Unknown,
        }
    }
}

/// Release name and status for one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub name: String,
    pub status: ReleaseStatus,
}

impl ReleaseInfo {
    pub fn new(name: impl Into<String>, status: ReleaseStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Built-in series table, newest first
const KNOWN_SERIES: &[(&str, &str, ReleaseStatus)] = &[
    ("2025.1", "Epoxy", ReleaseStatus::Current),
    ("2024.2", "Dalmatian", ReleaseStatus::Current),
    ("2024.1", "Caracal", ReleaseStatus::Current),
    ("2023.2", "Bobcat", ReleaseStatus::Maintained),
    ("2023.1", "Antelope", ReleaseStatus::Maintained),
    ("2022.0", "Zed", ReleaseStatus::Maintained),
    ("2021.0", "Yoga", ReleaseStatus::EndOfLife),
    ("2020.0", "Wallaby", ReleaseStatus::EndOfLife),
];

/// Expected upstream major version per component for each series
const COMPONENT_MATRIX: &[(&str, &[(&str, u64)])] = &[
    (
        "2024.1",
        &[
            ("nova", 29),
            ("neutron", 24),
            ("keystone", 25),
            ("glance", 30),
            ("cinder", 25),
            ("placement", 9),
            ("heat", 21),
            ("barbican", 15),
            ("octavia", 12),
            ("magnum", 11),
            ("masakari", 6),
            ("ceilometer", 18),
            ("gnocchi", 4),
            ("cloudkitty", 12),
            ("ironic", 22),
            ("designate", 15),
            ("zaqar", 10),
            ("blazar", 5),
            ("freezer", 4),
            ("horizon", 25),
        ],
    ),
    (
        "2024.2",
        &[
            ("nova", 30),
            ("neutron", 25),
            ("keystone", 26),
            ("glance", 31),
            ("cinder", 26),
            ("placement", 10),
            ("heat", 22),
            ("barbican", 16),
            ("octavia", 13),
            ("magnum", 12),
            ("masakari", 7),
            ("ceilometer", 19),
            ("gnocchi", 5),
            ("cloudkitty", 13),
            ("ironic", 23),
            ("designate", 16),
            ("zaqar", 11),
            ("blazar", 6),
            ("freezer", 5),
            ("horizon", 26),
        ],
    ),
    (
        "2025.1",
        &[
            ("nova", 31),
            ("neutron", 26),
            ("keystone", 27),
            ("glance", 32),
            ("cinder", 27),
            ("placement", 11),
            ("heat", 23),
            ("barbican", 17),
            ("octavia", 14),
            ("magnum", 13),
            ("masakari", 8),
            ("ceilometer", 20),
            ("gnocchi", 6),
            ("cloudkitty", 14),
            ("ironic", 24),
            ("designate", 17),
            ("zaqar", 12),
            ("blazar", 7),
            ("freezer", 6),
            ("horizon", 27),
        ],
    ),
];

/// Look up a series in the built-in table
pub fn builtin_release(series: &str) -> Option<ReleaseInfo> {
    KNOWN_SERIES
        .iter()
        .find(|(key, _, _)| *key == series)
        .map(|(_, name, status)| ReleaseInfo::new(*name, *status))
}

/// Expected upstream major version of `component` within `series`
pub fn expected_major(series: &str, component: &str) -> Option<u64> {
    let component = component.to_ascii_lowercase();
    COMPONENT_MATRIX
        .iter()
        .find(|(key, _)| *key == series)
        .and_then(|(_, majors)| majors.iter().find(|(name, _)| *name == component))
        .map(|(_, major)| *major)
}

/// Release notes page of a named release
pub fn release_notes_url(release_name: &str) -> String {
    format!("{}/{}/", RELEASE_NOTES_URL, release_name.to_lowercase())
}

/// Series whose matrix expects `major` for `component`
pub fn series_for_major(component: &str, major: u64) -> Option<&'static str> {
    let component = component.to_ascii_lowercase();
    COMPONENT_MATRIX
        .iter()
        .find(|(_, majors)| {
            majors
                .iter()
                .any(|(name, expected)| *name == component && *expected == major)
        })
        .map(|(series, _)| *series)
}

/// Mapping from numeric series to release information
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReleaseCatalog {
    series: IndexMap<String, ReleaseInfo>,
}

impl ReleaseCatalog {
    /// Catalog containing only the built-in table
    pub fn builtin() -> Self {
        KNOWN_SERIES
            .iter()
            .map(|(series, name, status)| (series.to_string(), ReleaseInfo::new(*name, *status)))
            .collect()
    }

    pub fn insert(&mut self, series: impl Into<String>, info: ReleaseInfo) {
        self.series.insert(series.into(), info);
    }

    /// Entry loaded into this catalog, without the built-in fallback
    pub fn get(&self, series: &str) -> Option<&ReleaseInfo> {
        self.series.get(series)
    }

    /// Entry for `series`, falling back to the built-in table
    pub fn lookup(&self, series: &str) -> Option<ReleaseInfo> {
        self.get(series)
            .cloned()
            .or_else(|| builtin_release(series))
    }

    pub fn status_of(&self, series: &str) -> Option<ReleaseStatus> {
        self.lookup(series).map(|info| info.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReleaseInfo)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<(String, ReleaseInfo)> for ReleaseCatalog {
    fn from_iter<I: IntoIterator<Item = (String, ReleaseInfo)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("current", ReleaseStatus::Current)]
    #[case("Maintained", ReleaseStatus::Maintained)]
    #[case("EOL", ReleaseStatus::EndOfLife)]
    #[case("end of life", ReleaseStatus::EndOfLife)]
    #[case("unmaintained", ReleaseStatus::EndOfLife)]
    #[case("something-else", ReleaseStatus::Unknown)]
    fn release_status_parse_returns_expected(#[case] label: &str, #[case] expected: ReleaseStatus) {
        assert_eq!(ReleaseStatus::parse(label), expected);
    }

    #[test]
    fn builtin_catalog_keeps_newest_first_order() {
        let catalog = ReleaseCatalog::builtin();

        let series: Vec<&str> = catalog.iter().map(|(s, _)| s.as_str()).collect();

        assert_eq!(series.first(), Some(&"2025.1"));
        assert_eq!(series.last(), Some(&"2020.0"));
        assert_eq!(catalog.len(), 8);
    }

    #[test]
    fn lookup_prefers_loaded_entry_over_builtin() {
        let mut catalog = ReleaseCatalog::default();
        catalog.insert("2024.2", ReleaseInfo::new("Dalmatian", ReleaseStatus::EndOfLife));

        assert_eq!(
            catalog.status_of("2024.2"),
            Some(ReleaseStatus::EndOfLife)
        );
    }

    #[test]
    fn lookup_falls_back_to_builtin_table() {
        let catalog = ReleaseCatalog::default();

        assert_eq!(
            catalog.lookup("2023.1"),
            Some(ReleaseInfo::new("Antelope", ReleaseStatus::Maintained))
        );
        assert!(catalog.get("2023.1").is_none());
    }

    #[test]
    fn lookup_returns_none_for_unknown_series() {
        assert_eq!(ReleaseCatalog::builtin().lookup("1999.9"), None);
    }

    #[rstest]
    #[case("2024.2", "nova", Some(30))]
    #[case("2025.1", "Keystone", Some(27))]
    #[case("2024.1", "skyline", None)]
    #[case("2023.1", "nova", None)]
    fn expected_major_returns_expected(
        #[case] series: &str,
        #[case] component: &str,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(expected_major(series, component), expected);
    }

    #[rstest]
    #[case("nova", 30, Some("2024.2"))]
    #[case("Placement", 9, Some("2024.1"))]
    #[case("nova", 28, None)]
    #[case("skyline", 5, None)]
    fn series_for_major_returns_expected(
        #[case] component: &str,
        #[case] major: u64,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(series_for_major(component, major), expected);
    }
}
