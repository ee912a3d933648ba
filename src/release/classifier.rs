//! Release alignment classification
//!
//! Classification runs once over a fully collected batch: the dominant
//! release depends on every record, so no record is classified before the
//! batch is complete.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::release::catalog::{ReleaseCatalog, ReleaseStatus, expected_major};
use crate::release::resolver::upstream_major;
use crate::release::types::ComponentRecord;

/// How a record's release relates to the dominant release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    /// Same release as the dominant release
    Aligned,
    /// Different release than the dominant release
    Mismatch,
    /// Version could not be mapped to a known release
    Unmappable,
}

/// Dashboard severity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// Components that must run the same release to interoperate
pub const CORE_SERVICES: &[&str] = &[
    "nova",
    "neutron",
    "keystone",
    "glance",
    "cinder",
    "placement",
];

/// Upstream major version outside the range expected for the release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MajorMismatch {
    pub found: u64,
    pub expected: u64,
}

/// Compatibility status of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityStatus {
    pub alignment: Alignment,
    /// The record's series is end-of-life, independent of alignment
    pub end_of_life: bool,
    /// Dominant release name, set for mismatches
    pub target: Option<String>,
    /// The record is a core service and core services span several releases
    pub core_service_mismatch: bool,
    /// The record is placement and runs a different release than nova
    pub placement_nova_mismatch: bool,
    pub major_mismatch: Option<MajorMismatch>,
}

impl CompatibilityStatus {
    /// Status with only an alignment set
    pub fn new(alignment: Alignment) -> Self {
        Self {
            alignment,
            end_of_life: false,
            target: None,
            core_service_mismatch: false,
            placement_nova_mismatch: false,
            major_mismatch: None,
        }
    }

    pub fn severity(&self) -> Severity {
        if self.alignment == Alignment::Mismatch || self.placement_nova_mismatch {
            Severity::Error
        } else if self.alignment == Alignment::Unmappable
            || self.end_of_life
            || self.core_service_mismatch
            || self.major_mismatch.is_some()
        {
            Severity::Warning
        } else {
            Severity::Ok
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity() == Severity::Ok
    }
}

impl fmt::Display for CompatibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end_of_life {
            write!(f, "EOL; ")?;
        }
        match (self.alignment, &self.target) {
            (Alignment::Aligned, _) => write!(f, "OK")?,
            (Alignment::Mismatch, Some(target)) => write!(f, "MISMATCH (target: {})", target)?,
            (Alignment::Mismatch, None) => write!(f, "MISMATCH")?,
            (Alignment::Unmappable, _) => write!(f, "UNMAPPABLE")?,
        }
        if self.core_service_mismatch {
            write!(f, "; CORE_SERVICE_MISMATCH")?;
        }
        if self.placement_nova_mismatch {
            write!(f, "; PLACEMENT/NOVA_MISMATCH")?;
        }
        if let Some(mismatch) = &self.major_mismatch {
            write!(
                f,
                "; VERSION_RANGE_MISMATCH (found {}.x, expected {}.x)",
                mismatch.found, mismatch.expected
            )?;
        }
        Ok(())
    }
}

/// The most frequently detected release in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DominantRelease {
    pub name: String,
    /// Numeric series of the first record carrying this release
    pub series: String,
    pub count: usize,
}

/// Count records per known release, in first-encountered order
pub fn release_distribution(records: &[ComponentRecord]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for name in records.iter().filter_map(ComponentRecord::release_name) {
        *counts.entry(name.to_string()).or_default() += 1;
    }
    counts
}

/// Determine the dominant release.
///
/// On equal counts the release encountered first in input order wins. The
/// tie-break is arbitrary; callers should not read meaning into it.
pub fn dominant_release(records: &[ComponentRecord]) -> Option<DominantRelease> {
    let distribution = release_distribution(records);
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in &distribution {
        if best.is_none_or(|(_, best_count)| *count > best_count) {
            best = Some((name.as_str(), *count));
        }
    }

    let (name, count) = best?;
    let series = records
        .iter()
        .find(|record| record.release_name() == Some(name))
        .and_then(ComponentRecord::numeric_series)?;

    Some(DominantRelease {
        name: name.to_string(),
        series: series.to_string(),
        count,
    })
}

/// Batch-wide facts every record is checked against
struct BatchContext<'a> {
    dominant: Option<DominantRelease>,
    /// Known core service releases differ
    core_mixed: bool,
    /// Release of the first nova record
    nova_release: Option<&'a str>,
}

impl<'a> BatchContext<'a> {
    fn new(records: &'a [ComponentRecord]) -> Self {
        let core_releases: HashSet<&str> = records
            .iter()
            .filter(|record| is_core_service(&record.component))
            .filter_map(ComponentRecord::release_name)
            .collect();

        Self {
            dominant: dominant_release(records),
            core_mixed: core_releases.len() > 1,
            nova_release: records
                .iter()
                .find(|record| record.component.eq_ignore_ascii_case("nova"))
                .and_then(ComponentRecord::release_name),
        }
    }
}

fn is_core_service(component: &str) -> bool {
    CORE_SERVICES
        .iter()
        .any(|core| core.eq_ignore_ascii_case(component))
}

/// Annotate every record with its compatibility status.
///
/// Returns annotated copies; the input is left untouched. Re-running on the
/// output yields the same statuses.
pub fn classify(records: &[ComponentRecord], catalog: &ReleaseCatalog) -> Vec<ComponentRecord> {
    let context = BatchContext::new(records);

    records
        .iter()
        .map(|record| {
            let mut annotated = record.clone();
            let (status, recommendation) = classify_record(record, &context, catalog);
            annotated.status = Some(status);
            annotated.recommendation = recommendation;
            annotated
        })
        .collect()
}

fn classify_record(
    record: &ComponentRecord,
    context: &BatchContext<'_>,
    catalog: &ReleaseCatalog,
) -> (CompatibilityStatus, Option<String>) {
    let dominant = context.dominant.as_ref();
    let major_mismatch = major_mismatch(record, dominant);

    let Some(release_name) = record.release_name() else {
        let mut status = CompatibilityStatus::new(Alignment::Unmappable);
        status.major_mismatch = major_mismatch;
        return (status, None);
    };

    let mut status = CompatibilityStatus::new(Alignment::Aligned);
    status.end_of_life = record
        .numeric_series()
        .and_then(|series| catalog.status_of(series))
        == Some(ReleaseStatus::EndOfLife);
    status.core_service_mismatch = context.core_mixed && is_core_service(&record.component);
    status.placement_nova_mismatch = record.component.eq_ignore_ascii_case("placement")
        && context
            .nova_release
            .is_some_and(|nova| nova != release_name);
    status.major_mismatch = major_mismatch;

    // A known release always yields a dominant release
    match dominant {
        Some(dominant) if dominant.name != release_name => {
            status.alignment = Alignment::Mismatch;
            status.target = Some(dominant.name.clone());
            let recommendation = format!("Unify to {} ({})", dominant.name, dominant.series);
            (status, Some(recommendation))
        }
        _ => (status, None),
    }
}

/// Compare the upstream major of a record against the component matrix.
///
/// The upstream major comes from the resolved upstream tag, or from the
/// detected version itself when it is semver-style (`30.1.0`). The expected
/// major is looked up for the record's own series, else the dominant one.
fn major_mismatch(
    record: &ComponentRecord,
    dominant: Option<&DominantRelease>,
) -> Option<MajorMismatch> {
    let found = match &record.upstream {
        Some(upstream) => upstream_major(&upstream.tag),
        None => upstream_major(&record.detected_version),
    }?;
    let series = record
        .numeric_series()
        .or(dominant.map(|dominant| dominant.series.as_str()))?;
    let expected = expected_major(series, &record.component)?;

    (found != expected).then_some(MajorMismatch { found, expected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::catalog::ReleaseInfo;
    use crate::release::resolver::VersionResolver;
    use crate::release::types::{SourceLocation, UpstreamVersion};
    use rstest::rstest;

    fn records(versions: &[(&str, &str)]) -> Vec<ComponentRecord> {
        let resolver = VersionResolver::default();
        versions
            .iter()
            .enumerate()
            .map(|(i, (component, version))| {
                ComponentRecord::new(
                    *component,
                    SourceLocation::new("values.yaml", i, 0),
                    *version,
                    &resolver,
                )
            })
            .collect()
    }

    fn alignments(records: &[ComponentRecord]) -> Vec<Alignment> {
        records
            .iter()
            .map(|r| r.status.as_ref().unwrap().alignment)
            .collect()
    }

    #[test]
    fn classify_marks_majority_ok_and_minority_mismatch() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("neutron", "2024.2.12"),
            ("keystone", "2024.1-latest"),
            ("glance", "2024.2"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        assert_eq!(
            alignments(&result),
            vec![
                Alignment::Aligned,
                Alignment::Aligned,
                Alignment::Mismatch,
                Alignment::Aligned,
            ]
        );
        assert_eq!(
            result[2].status.as_ref().unwrap().target.as_deref(),
            Some("Dalmatian")
        );
        assert_eq!(
            result[2].recommendation.as_deref(),
            Some("Unify to Dalmatian (2024.2)")
        );
        assert_eq!(result[0].recommendation, None);
    }

    #[test]
    fn classify_marks_unparseable_and_unknown_series_unmappable() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("heat", "not-a-version"),
            ("horizon", "2031.1.0"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        assert_eq!(
            alignments(&result),
            vec![
                Alignment::Aligned,
                Alignment::Unmappable,
                Alignment::Unmappable,
            ]
        );
        assert_eq!(
            result[1].status.as_ref().unwrap().severity(),
            Severity::Warning
        );
    }

    #[test]
    fn classify_flags_eol_even_when_majority() {
        let input = records(&[
            ("nova", "2021.0.5"),
            ("neutron", "2021.0.7"),
            ("keystone", "2024.2.1"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        let nova = result[0].status.as_ref().unwrap();
        assert_eq!(nova.alignment, Alignment::Aligned);
        assert!(nova.end_of_life);
        assert_eq!(nova.to_string(), "EOL; OK; CORE_SERVICE_MISMATCH");

        let keystone = result[2].status.as_ref().unwrap();
        assert_eq!(keystone.alignment, Alignment::Mismatch);
        assert!(!keystone.end_of_life);
        assert_eq!(
            keystone.to_string(),
            "MISMATCH (target: Yoga); CORE_SERVICE_MISMATCH"
        );
    }

    #[test]
    fn classify_uses_catalog_status_for_eol() {
        let mut catalog = ReleaseCatalog::builtin();
        catalog.insert("2024.1", ReleaseInfo::new("Caracal", ReleaseStatus::EndOfLife));
        let input = records(&[("nova", "2024.1.3")]);

        let result = classify(&input, &catalog);

        assert!(result[0].status.as_ref().unwrap().end_of_life);
    }

    #[test]
    fn classify_is_idempotent() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("neutron", "2024.1.2"),
            ("glance", "2024.2.3"),
            ("heat", "garbage"),
        ]);
        let catalog = ReleaseCatalog::builtin();

        let once = classify(&input, &catalog);
        let twice = classify(&once, &catalog);

        assert_eq!(once, twice);
    }

    #[test]
    fn classify_leaves_input_untouched() {
        let input = records(&[("nova", "2024.2.396")]);

        let _ = classify(&input, &ReleaseCatalog::builtin());

        assert_eq!(input[0].status, None);
    }

    #[test]
    fn classify_empty_batch_returns_empty() {
        assert!(classify(&[], &ReleaseCatalog::builtin()).is_empty());
    }

    #[test]
    fn dominant_release_breaks_ties_by_first_encountered() {
        let input = records(&[
            ("nova", "2024.1.1"),
            ("neutron", "2024.2.1"),
            ("glance", "2024.2.2"),
            ("keystone", "2024.1.4"),
        ]);

        let dominant = dominant_release(&input).unwrap();

        assert_eq!(
            dominant,
            DominantRelease {
                name: "Caracal".to_string(),
                series: "2024.1".to_string(),
                count: 2,
            }
        );
    }

    #[test]
    fn dominant_release_ignores_unknown_releases() {
        let input = records(&[
            ("nova", "2031.1.0"),
            ("neutron", "2031.1.1"),
            ("glance", "2025.1.2"),
        ]);

        assert_eq!(dominant_release(&input).unwrap().name, "Epoxy");
    }

    #[test]
    fn dominant_release_is_none_without_known_releases() {
        let input = records(&[("nova", "latest")]);

        assert_eq!(dominant_release(&input), None);
    }

    #[test]
    fn release_distribution_counts_in_first_encountered_order() {
        let input = records(&[
            ("nova", "2025.1.0"),
            ("neutron", "2024.2.1"),
            ("glance", "2024.2.2"),
            ("heat", "invalid"),
        ]);

        let distribution: Vec<(String, usize)> = release_distribution(&input).into_iter().collect();

        assert_eq!(
            distribution,
            vec![("Epoxy".to_string(), 1), ("Dalmatian".to_string(), 2)]
        );
    }

    #[test]
    fn classify_flags_core_services_on_several_releases() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("neutron", "2024.2.12"),
            ("cinder", "2024.1.3"),
            ("heat", "2024.1.1"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        let flagged: Vec<bool> = result
            .iter()
            .map(|r| r.status.as_ref().unwrap().core_service_mismatch)
            .collect();
        assert_eq!(flagged, vec![true, true, true, false]);
        assert_eq!(
            result[0].status.as_ref().unwrap().severity(),
            Severity::Warning
        );
        assert_eq!(
            result[2].status.as_ref().unwrap().to_string(),
            "MISMATCH (target: Dalmatian); CORE_SERVICE_MISMATCH"
        );
    }

    #[test]
    fn classify_ignores_unmappable_core_services_for_core_check() {
        let input = records(&[("nova", "2024.2.396"), ("keystone", "latest")]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        assert!(!result[0].status.as_ref().unwrap().core_service_mismatch);
        assert!(result[0].status.as_ref().unwrap().is_ok());
    }

    #[test]
    fn classify_flags_placement_behind_nova() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("neutron", "2024.2.12"),
            ("glance", "2024.2.3"),
            ("placement", "2024.1.2"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        let placement = result[3].status.as_ref().unwrap();
        assert!(placement.placement_nova_mismatch);
        assert_eq!(placement.severity(), Severity::Error);
        assert_eq!(
            placement.to_string(),
            "MISMATCH (target: Dalmatian); CORE_SERVICE_MISMATCH; PLACEMENT/NOVA_MISMATCH"
        );
        assert!(!result[0].status.as_ref().unwrap().placement_nova_mismatch);
    }

    #[test]
    fn classify_compares_placement_with_first_nova_record() {
        let input = records(&[
            ("nova", "2024.1.1"),
            ("nova", "2024.2.396"),
            ("placement", "2024.1.2"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        assert!(!result[2].status.as_ref().unwrap().placement_nova_mismatch);
    }

    #[test]
    fn classify_flags_semver_version_outside_matrix_range() {
        let input = records(&[
            ("nova", "2024.2.396"),
            ("neutron", "2024.2.12"),
            ("keystone", "25.0.1"),
            ("glance", "29.0.0"),
        ]);

        let result = classify(&input, &ReleaseCatalog::builtin());

        let keystone = result[2].status.as_ref().unwrap();
        assert_eq!(keystone.alignment, Alignment::Unmappable);
        assert_eq!(
            keystone.major_mismatch,
            Some(MajorMismatch {
                found: 25,
                expected: 26,
            })
        );
        assert_eq!(
            keystone.to_string(),
            "UNMAPPABLE; VERSION_RANGE_MISMATCH (found 25.x, expected 26.x)"
        );
        assert_eq!(keystone.severity(), Severity::Warning);
        assert_eq!(result[3].status.as_ref().unwrap().major_mismatch, None);
    }

    #[test]
    fn classify_checks_upstream_tag_against_record_series() {
        let mut input = records(&[("nova", "2024.2.396+gfd123-628a320c")]);
        input[0].upstream = Some(UpstreamVersion {
            tag: "29.2.0".to_string(),
            commit_sha: "628a320c".to_string(),
            exact: true,
            series: None,
            release_name: None,
            commit_url: String::new(),
            tag_url: String::new(),
            release_notes_url: None,
        });

        let result = classify(&input, &ReleaseCatalog::builtin());

        let nova = result[0].status.as_ref().unwrap();
        assert_eq!(nova.alignment, Alignment::Aligned);
        assert_eq!(
            nova.major_mismatch,
            Some(MajorMismatch {
                found: 29,
                expected: 30,
            })
        );
        assert_eq!(nova.severity(), Severity::Warning);
    }

    #[rstest]
    #[case(Alignment::Aligned, false, false, false, None, Severity::Ok)]
    #[case(Alignment::Aligned, true, false, false, None, Severity::Warning)]
    #[case(Alignment::Unmappable, false, false, false, None, Severity::Warning)]
    #[case(Alignment::Mismatch, false, false, false, None, Severity::Error)]
    #[case(Alignment::Mismatch, true, false, false, None, Severity::Error)]
    #[case(Alignment::Aligned, false, true, false, None, Severity::Warning)]
    #[case(Alignment::Aligned, false, false, true, None, Severity::Error)]
    #[case(Alignment::Aligned, false, true, true, None, Severity::Error)]
    #[case(Alignment::Aligned, false, false, false, Some((29, 30)), Severity::Warning)]
    #[case(Alignment::Mismatch, false, true, false, Some((29, 30)), Severity::Error)]
    fn severity_returns_expected(
        #[case] alignment: Alignment,
        #[case] end_of_life: bool,
        #[case] core_service_mismatch: bool,
        #[case] placement_nova_mismatch: bool,
        #[case] major: Option<(u64, u64)>,
        #[case] expected: Severity,
    ) {
        let status = CompatibilityStatus {
            alignment,
            end_of_life,
            target: None,
            core_service_mismatch,
            placement_nova_mismatch,
            major_mismatch: major.map(|(found, wanted)| MajorMismatch {
                found,
                expected: wanted,
            }),
        };

        assert_eq!(status.severity(), expected);
    }
}
