//! Scan report assembly and plain-text rendering

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::release::catalog::release_notes_url;
use crate::release::classifier::{
    Alignment, CompatibilityStatus, DominantRelease, Severity, dominant_release,
    release_distribution,
};
use crate::release::types::ComponentRecord;

const RECOMMENDATION_WIDTH: usize = 48;
const COLUMNS: usize = 7;

/// Result of one scan over a classified batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub root: PathBuf,
    pub dominant: Option<DominantRelease>,
    /// Known release name -> record count, in first-encountered order
    pub distribution: IndexMap<String, usize>,
    pub records: Vec<ComponentRecord>,
}

impl ScanReport {
    /// Build a report from classified records
    pub fn build(root: impl Into<PathBuf>, records: Vec<ComponentRecord>) -> Self {
        Self {
            scanned_at: Utc::now(),
            root: root.into(),
            dominant: dominant_release(&records),
            distribution: release_distribution(&records),
            records,
        }
    }

    /// Number of records whose status is not plain OK
    pub fn issues_found(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status.as_ref().is_some_and(|status| !status.is_ok()))
            .count()
    }

    pub fn overall_recommendation(&self) -> String {
        let Some(dominant) = &self.dominant else {
            return "Unable to determine recommended release. Review component versions manually."
                .to_string();
        };

        if self.distribution.len() == 1 {
            let caveats = self.caveats(&dominant.name);
            if caveats.is_empty() {
                return format!(
                    "All components are aligned to {} ({}). Deployment is compatible.",
                    dominant.name, dominant.series
                );
            }
            return format!(
                "All components with a known release are aligned to {} ({}), but the deployment needs attention: {}.",
                dominant.name,
                dominant.series,
                caveats.join("; ")
            );
        }

        let releases: Vec<&str> = self.distribution.keys().map(String::as_str).collect();
        format!(
            "Mixed releases detected: {}. Recommend unifying all components to {} ({}) for compatibility. See {}",
            releases.join(", "),
            dominant.name,
            dominant.series,
            release_notes_url(&dominant.name)
        )
    }

    /// Issues that remain when every known release agrees
    fn caveats(&self, release: &str) -> Vec<String> {
        let statuses: Vec<&CompatibilityStatus> = self
            .records
            .iter()
            .filter_map(|record| record.status.as_ref())
            .collect();

        let mut caveats = Vec::new();
        if statuses.iter().any(|status| status.end_of_life) {
            caveats.push(format!("{} is end-of-life", release));
        }
        let unmappable = statuses
            .iter()
            .filter(|status| status.alignment == Alignment::Unmappable)
            .count();
        if unmappable > 0 {
            caveats.push(format!(
                "{} version(s) could not be mapped to a release",
                unmappable
            ));
        }
        let out_of_range = statuses
            .iter()
            .filter(|status| status.major_mismatch.is_some())
            .count();
        if out_of_range > 0 {
            caveats.push(format!(
                "{} version(s) fall outside the expected upstream range",
                out_of_range
            ));
        }
        caveats
    }

    /// Render the report as an aligned plain-text table with a summary
    pub fn render_text(&self) -> String {
        let rows: Vec<[String; COLUMNS]> = self.records.iter().map(row).collect();
        let headers = [
            "Component",
            "Version",
            "Release",
            "Status",
            "Upstream",
            "Source",
            "Recommendation",
        ];

        let mut widths = headers.map(str::len);
        for cells in &rows {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "Scanned {} at {}", self.root.display(), self.scanned_at.to_rfc3339());
        let _ = writeln!(out);
        write_row(&mut out, &headers.map(str::to_string), &widths);
        write_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
        for cells in &rows {
            write_row(&mut out, cells, &widths);
        }

        if self
            .records
            .iter()
            .any(|record| record.upstream.as_ref().is_some_and(|upstream| !upstream.exact))
        {
            let _ = writeln!(out, "* nearest earlier upstream tag, no tag on the commit itself");
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Components: {}", self.records.len());
        let _ = writeln!(out, "Issues found: {}{}", self.issues_found(), self.severity_summary());
        if let Some(dominant) = &self.dominant {
            let _ = writeln!(
                out,
                "Dominant release: {} ({}), {} of {} records",
                dominant.name,
                dominant.series,
                dominant.count,
                self.records.len()
            );
        }
        let _ = writeln!(out, "{}", self.overall_recommendation());
        out
    }

    /// ` (1 ERROR, 2 WARNING)`, or empty when every record is OK
    fn severity_summary(&self) -> String {
        let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
        for status in self.records.iter().filter_map(|record| record.status.as_ref()) {
            *counts.entry(status.severity()).or_default() += 1;
        }

        let parts: Vec<String> = counts
            .iter()
            .rev()
            .filter(|(severity, _)| **severity != Severity::Ok)
            .map(|(severity, count)| format!("{} {}", count, severity.as_str()))
            .collect();
        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

fn row(record: &ComponentRecord) -> [String; COLUMNS] {
    let release = record
        .resolved
        .as_ref()
        .map(|resolved| resolved.formatted_label.clone())
        .unwrap_or_else(|| "-".to_string());
    let status = record
        .status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let upstream = match &record.upstream {
        Some(upstream) if upstream.exact => upstream.tag.clone(),
        Some(upstream) => format!("{}*", upstream.tag),
        None => "-".to_string(),
    };

    let mut source = record.source.to_string();
    if !record.additional_sources.is_empty() {
        let _ = write!(source, " (+{})", record.additional_sources.len());
    }

    [
        record.component.clone(),
        record.detected_version.clone(),
        release,
        status,
        upstream,
        source,
        truncate(record.recommendation.as_deref().unwrap_or("-"), RECOMMENDATION_WIDTH),
    ]
}

fn write_row(out: &mut String, cells: &[String; COLUMNS], widths: &[usize; COLUMNS]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max - 3).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::catalog::ReleaseCatalog;
    use crate::release::classifier::classify;
    use crate::release::resolver::VersionResolver;
    use crate::release::types::{SourceLocation, UpstreamVersion};

    fn report(versions: &[(&str, &str)]) -> ScanReport {
        let resolver = VersionResolver::default();
        let records: Vec<ComponentRecord> = versions
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
            .collect();
        ScanReport::build("/repo", classify(&records, &ReleaseCatalog::builtin()))
    }

    #[test]
    fn overall_recommendation_for_aligned_batch() {
        let report = report(&[("nova", "2024.2.1"), ("neutron", "2024.2.7")]);

        assert_eq!(report.issues_found(), 0);
        assert_eq!(
            report.overall_recommendation(),
            "All components are aligned to Dalmatian (2024.2). Deployment is compatible."
        );
    }

    #[test]
    fn overall_recommendation_for_mixed_batch() {
        let report = report(&[
            ("nova", "2024.2.1"),
            ("neutron", "2024.1.7"),
            ("glance", "2024.2.3"),
        ]);

        assert_eq!(report.issues_found(), 3);
        assert_eq!(
            report.overall_recommendation(),
            "Mixed releases detected: Dalmatian, Caracal. Recommend unifying all components to \
             Dalmatian (2024.2) for compatibility. See https://releases.openstack.org/dalmatian/"
        );
    }

    #[test]
    fn overall_recommendation_without_known_releases() {
        let report = report(&[("nova", "latest")]);

        assert_eq!(report.dominant, None);
        assert_eq!(report.issues_found(), 1);
        assert_eq!(
            report.overall_recommendation(),
            "Unable to determine recommended release. Review component versions manually."
        );
    }

    #[test]
    fn overall_recommendation_warns_about_eol_and_unmappable_versions() {
        let report = report(&[("nova", "2021.0.1"), ("heat", "latest-build")]);

        assert_eq!(report.distribution.len(), 1);
        assert_eq!(report.issues_found(), 2);
        assert_eq!(
            report.overall_recommendation(),
            "All components with a known release are aligned to Yoga (2021.0), but the deployment \
             needs attention: Yoga is end-of-life; 1 version(s) could not be mapped to a release."
        );
    }

    #[test]
    fn overall_recommendation_warns_about_out_of_range_versions() {
        let report = report(&[("nova", "2024.2.1"), ("keystone", "25.0.1")]);

        assert_eq!(
            report.overall_recommendation(),
            "All components with a known release are aligned to Dalmatian (2024.2), but the \
             deployment needs attention: 1 version(s) could not be mapped to a release; \
             1 version(s) fall outside the expected upstream range."
        );
    }

    #[test]
    fn render_text_marks_nearest_upstream_tag() {
        let mut report = report(&[("nova", "2024.2.396+gfd123-628a320c")]);
        report.records[0].upstream = Some(UpstreamVersion {
            tag: "30.1.0".to_string(),
            commit_sha: "628a320c".to_string(),
            exact: false,
            series: Some("2024.2".to_string()),
            release_name: Some("Dalmatian".to_string()),
            commit_url: "https://github.com/openstack/nova/commit/628a320c".to_string(),
            tag_url: "https://github.com/openstack/nova/releases/tag/30.1.0".to_string(),
            release_notes_url: Some("https://releases.openstack.org/dalmatian/".to_string()),
        });

        let text = report.render_text();

        assert!(text.lines().nth(2).unwrap().contains("Upstream"));
        assert!(text.lines().nth(4).unwrap().contains("30.1.0*"));
        assert!(text.contains("* nearest earlier upstream tag"));
    }

    #[test]
    fn issues_found_counts_eol_records() {
        let report = report(&[("nova", "2021.0.5"), ("neutron", "2021.0.6")]);

        assert_eq!(report.issues_found(), 2);
    }

    #[test]
    fn render_text_lists_records_and_summary() {
        let report = report(&[("nova", "2024.2.396"), ("keystone", "2024.1-latest")]);

        let text = report.render_text();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[2].starts_with("Component"));
        assert!(lines[3].starts_with("---------"));
        assert!(lines[4].starts_with("nova"));
        assert!(lines[4].contains("dalmatian v2.396"));
        assert!(lines[4].contains("values.yaml:1"));
        assert!(lines[5].contains("MISMATCH (target: Dalmatian)"));
        assert!(lines[5].contains("Unify to Dalmatian (2024.2)"));
        assert!(lines[4].contains("CORE_SERVICE_MISMATCH"));
        assert!(text.contains("Issues found: 2 (1 ERROR, 1 WARNING)"));
        assert!(text.contains("Dominant release: Dalmatian (2024.2), 1 of 2 records"));
    }

    #[test]
    fn truncate_shortens_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn report_serializes_with_camel_case_keys() {
        let report = report(&[("nova", "2024.2.1")]);

        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("scannedAt").is_some());
        assert_eq!(value["dominant"]["name"], "Dalmatian");
        assert_eq!(value["distribution"]["Dalmatian"], 1);
    }
}
