use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Network-related constants
// =============================================================================

/// Official release series metadata
pub const DEFAULT_CATALOG_URL: &str = "https://releases.openstack.org/_releases/releases.json";

/// Default base URL for the GitHub API
pub const DEFAULT_FORGE_URL: &str = "https://api.github.com";

/// Default base URL for browser links to upstream repositories
pub const DEFAULT_FORGE_WEB_URL: &str = "https://github.com";

/// Per-release notes live under `{RELEASE_NOTES_URL}/{release}/`
pub const RELEASE_NOTES_URL: &str = "https://releases.openstack.org";

/// Organization that hosts the upstream component repositories
pub const DEFAULT_FORGE_ORGANIZATION: &str = "openstack";

/// Environment variable holding an optional GitHub token
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Timeout for fetch operations in milliseconds (10 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 10_000;

/// Delay between starting each tag fetch to avoid rate limiting (250ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 250;

/// Page size requested from the tags API
pub const TAGS_PER_PAGE: usize = 100;

/// Newest candidate tags whose commit dates are fetched when no tag sits on
/// the deployed commit
pub const MAX_TAG_DATE_LOOKUPS: usize = 10;

const APP_NAME: &str = "release-align";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub forge: ForgeConfig,
    pub scan: ScanConfig,
}

/// Release catalog configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    /// URL of the remote series metadata
    pub url: String,
    /// Whether to refresh the catalog from `url` at start-up
    pub refresh: bool,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            refresh: true,
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Code forge (GitHub) configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ForgeConfig {
    pub base_url: String,
    /// Base URL of the browsable forge, used for commit and tag links
    pub web_url: String,
    pub organization: String,
    /// Name of the environment variable to read the API token from
    pub token_env: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FORGE_URL.to_string(),
            web_url: DEFAULT_FORGE_WEB_URL.to_string(),
            organization: DEFAULT_FORGE_ORGANIZATION.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

impl ForgeConfig {
    /// Reads the token from the configured environment variable, if set.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Repository scan configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "reports".to_string(),
            ],
        }
    }
}

/// Load configuration from `path`.
///
/// A missing file yields the defaults; an unreadable or malformed file is an error.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the path to the data directory for release-align.
/// Uses $XDG_DATA_HOME/release-align if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/release-align,
/// or ./release-align if neither is available.
pub fn data_dir() -> PathBuf {
    base_dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the default config file path ($XDG_CONFIG_HOME/release-align/config.json).
pub fn config_path() -> PathBuf {
    base_dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
    .join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("release-align.log")
}

fn base_dir_with_env(
    xdg_home: Option<String>,
    home_dir: Option<PathBuf>,
    home_fallback: &str,
) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}
