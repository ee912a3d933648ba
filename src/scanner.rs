//! Repository scanner
//!
//! Walks a checkout, dispatches each recognised file to its parser and
//! consolidates the detections into component records.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::parser::types::detect_source_kind;
use crate::parser::{DetectedVersion, create_default_parsers};
use crate::release::resolver::VersionResolver;
use crate::release::types::{ComponentRecord, SourceLocation};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Scan `root` and return one record per distinct (component, version).
///
/// Records keep the first location a version was seen at; later files with
/// the same component version are listed in `additional_sources`. Unreadable
/// files and parse failures are logged and skipped.
pub fn scan_repository(
    root: &Path,
    config: &ScanConfig,
    resolver: &VersionResolver,
) -> Result<Vec<ComponentRecord>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let parsers = create_default_parsers();
    let mut detections: Vec<(PathBuf, DetectedVersion)> = Vec::new();
    let mut files_scanned = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry, config));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to walk {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative_posix = relative.to_string_lossy().replace('\\', "/");
        let Some(kind) = detect_source_kind(&relative_posix) else {
            continue;
        };
        let Some(parser) = parsers.get(&kind) else {
            continue;
        };

        let bytes = match std::fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        files_scanned += 1;

        match parser.parse(&content) {
            Ok(found) => {
                debug!(
                    "{} ({}): {} versions",
                    relative_posix,
                    kind.as_str(),
                    found.len()
                );
                detections.extend(found.into_iter().map(|d| (relative.to_path_buf(), d)));
            }
            Err(e) => warn!("Failed to parse {}: {}", relative_posix, e),
        }
    }

    let records = consolidate(detections, resolver);
    info!(
        "Scanned {} files under {}: {} component versions",
        files_scanned,
        root.display(),
        records.len()
    );

    Ok(records)
}

fn is_excluded(entry: &DirEntry, config: &ScanConfig) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.exclude_dirs.iter().any(|excluded| excluded == name))
}

fn consolidate(
    detections: Vec<(PathBuf, DetectedVersion)>,
    resolver: &VersionResolver,
) -> Vec<ComponentRecord> {
    let mut records: IndexMap<(String, String), ComponentRecord> = IndexMap::new();

    for (path, detected) in detections {
        let key = (detected.component.clone(), detected.version.clone());
        match records.get_mut(&key) {
            Some(record) => {
                if record.source.path != path && !record.additional_sources.contains(&path) {
                    record.additional_sources.push(path);
                }
            }
            None => {
                let record = ComponentRecord::new(
                    detected.component,
                    SourceLocation::new(path, detected.line, detected.column),
                    detected.version,
                    resolver,
                );
                records.insert(key, record);
            }
        }
    }

    records.into_values().collect()
}
