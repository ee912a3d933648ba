//! Line-oriented parser for free-form YAML manifests
//!
//! Values files, overrides and workflows have no fixed layout, so versions
//! are scraped per line. A line is only considered when it names a known
//! component. Patterns are tried in order and the first match wins:
//!
//! 1. `appVersion: "2025.1.2"`
//! 2. `version: 2024.2.186` (also covers `nova_version:` and `openstack_version:`)
//! 3. `image: registry/nova:2024.1-latest` or `tag: 2025.1`
//! 4. `nova: 2024.2.555`

use regex::Regex;

use crate::parser::traits::{ParseError, Parser};
use crate::parser::types::{DetectedVersion, KNOWN_COMPONENTS};

const RELEASE_CODED: &str = r"\d{4}\.\d(?:[.\d]+)?(?:[-+]\w+)?";

/// Parser for YAML files without a known structure
pub struct ComponentLineParser {
    /// Version patterns shared by every component, in priority order
    line_patterns: Vec<Regex>,
    /// `<component>: YYYY.N` for each known component
    direct_patterns: Vec<(&'static str, Regex)>,
}

impl ComponentLineParser {
    pub fn new() -> Self {
        let line_patterns = vec![
            Regex::new(r#"(?i)appVersion\s*[:=]\s*["']?([\d.]+[^"'\s]*)"#).unwrap(),
            Regex::new(r#"(?i)version\s*[:=]\s*["']?([\d.]+[^"'\s]*)"#).unwrap(),
            Regex::new(&format!(r"(?i)(?:image|tag)\s*[:=]\s*.*?:?({})", RELEASE_CODED)).unwrap(),
        ];

        let direct_patterns = KNOWN_COMPONENTS
            .iter()
            .map(|component| {
                let pattern = format!(r"(?i){}\s*[:=]\s*({})", component, RELEASE_CODED);
                (*component, Regex::new(&pattern).unwrap())
            })
            .collect();

        Self {
            line_patterns,
            direct_patterns,
        }
    }

    /// Version and its byte column for `component` on `line`
    fn extract<'a>(&self, line: &'a str, component: &str) -> Option<(&'a str, usize)> {
        let direct = self
            .direct_patterns
            .iter()
            .find(|(name, _)| *name == component)
            .map(|(_, re)| re);

        self.line_patterns
            .iter()
            .chain(direct)
            .find_map(|re| re.captures(line)?.get(1))
            .map(|m| (m.as_str(), m.start()))
    }
}

impl Default for ComponentLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ComponentLineParser {
    fn parse(&self, content: &str) -> Result<Vec<DetectedVersion>, ParseError> {
        let mut results = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }

            let lowered = line.to_ascii_lowercase();
            for component in KNOWN_COMPONENTS
                .iter()
                .copied()
                .filter(|component| lowered.contains(*component))
            {
                if let Some((version, column)) = self.extract(line, component) {
                    results.push(DetectedVersion::new(component, version, line_num, column));
                }
            }
        }

        Ok(results)
    }
}
