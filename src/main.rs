use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use release_align::config::{self, AppConfig};
use release_align::logging;
use release_align::release::catalog::ReleaseCatalog;
use release_align::release::classifier::{classify, dominant_release};
use release_align::release::forge::{
    ForgeLinks, GitHubForge, recommend_versions, resolve_upstream_versions,
};
use release_align::release::remote::{CatalogSource, ReleasesSiteSource, load_catalog};
use release_align::release::resolver::VersionResolver;
use release_align::report::ScanReport;
use release_align::scanner::scan_repository;

#[derive(Parser)]
#[command(name = "release-align")]
#[command(version, about = "Check that deployed components agree on one release series")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a repository and report release alignment
    Scan {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Use the built-in release table only
        #[arg(long)]
        offline: bool,

        /// Pin deployed commits to upstream tags and suggest concrete
        /// versions for mismatched components
        #[arg(long)]
        resolve_tags: bool,
    },
    /// Resolve version tags to their release series
    Resolve {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Print the release catalog
    Catalog {
        /// Use the built-in release table only
        #[arg(long)]
        offline: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_path = config::log_path();
    let _guard = logging::init(&log_path)
        .inspect_err(|e| {
            eprintln!(
                "Warning: logging disabled, cannot write {}: {}",
                log_path.display(),
                e
            )
        })
        .ok();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config::config_path);
    let config = config::load_config(&config_path)?;
    info!("Loaded config from {}", config_path.display());

    match cli.command {
        Command::Scan {
            path,
            offline,
            resolve_tags,
        } => scan(&config, &path, offline, resolve_tags).await,
        Command::Resolve { tags } => {
            let resolver = VersionResolver::new(catalog(&config, false).await);
            for tag in tags {
                match resolver.resolve(&tag) {
                    Some(resolved) => println!(
                        "{}\t{}\t{}\t{}",
                        tag, resolved.numeric_series, resolved.release_name, resolved.formatted_label
                    ),
                    None => println!("{}\tnot found", tag),
                }
            }
            Ok(())
        }
        Command::Catalog { offline } => {
            for (series, info) in catalog(&config, offline).await.iter() {
                println!("{}\t{}\t{}", series, info.name, info.status.as_str());
            }
            Ok(())
        }
    }
}

async fn scan(
    config: &AppConfig,
    path: &Path,
    offline: bool,
    resolve_tags: bool,
) -> anyhow::Result<()> {
    let catalog = catalog(config, offline).await;
    let resolver = VersionResolver::new(catalog);

    let mut records = scan_repository(path, &config.scan, &resolver)?;

    let forge = if resolve_tags && offline {
        warn!("Skipping upstream tag lookup in offline mode");
        None
    } else if resolve_tags {
        Some(GitHubForge::new(
            &config.forge.base_url,
            &config.forge.organization,
            config.forge.token(),
            Duration::from_millis(config.catalog.timeout_ms),
        )?)
    } else {
        None
    };

    if let Some(forge) = &forge {
        let links = ForgeLinks::new(&config.forge.web_url, &config.forge.organization);
        resolve_upstream_versions(&mut records, forge, forge, &links).await;
    }

    let mut records = classify(&records, resolver.catalog());

    if let (Some(forge), Some(dominant)) = (&forge, dominant_release(&records)) {
        recommend_versions(&mut records, forge, &dominant).await;
    }

    print!("{}", ScanReport::build(path.to_path_buf(), records).render_text());
    Ok(())
}

async fn catalog(config: &AppConfig, offline: bool) -> ReleaseCatalog {
    if offline || !config.catalog.refresh {
        return ReleaseCatalog::builtin();
    }

    match ReleasesSiteSource::new(
        &config.catalog.url,
        Duration::from_millis(config.catalog.timeout_ms),
    ) {
        Ok(source) => load_catalog(Some(&source as &dyn CatalogSource)).await,
        Err(e) => {
            warn!("Failed to build catalog client: {}", e);
            ReleaseCatalog::builtin()
        }
    }
}
