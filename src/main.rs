use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use podcast_gallery::api::ApiClient;
use podcast_gallery::audit;
use podcast_gallery::config::{Config, DEFAULT_CONFIG_PATH};
use podcast_gallery::gallery::{load_curated, Bootstrap, GalleryStatus, GalleryViewState};
use podcast_gallery::render::HtmlPage;
use podcast_gallery::storage::{CachedSource, Database, DatabaseError, MetadataCache};

#[derive(Parser, Debug)]
#[command(
    name = "podcast-gallery",
    about = "Build a curated podcast gallery from NeoDB metadata"
)]
struct Args {
    /// Config file (TOML)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch metadata and write the gallery page
    Build {
        /// Serve metadata from the cache instead of the catalog
        #[arg(long)]
        offline: bool,

        /// Output directory (overrides `output_dir`)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Open the built page in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Check every curated podcast against the catalog and save a report
    Audit {
        /// Report directory (defaults to `{output_dir}/audit`)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("podcast_gallery=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?
        .with_process_env();
    tracing::debug!(config = ?config, "Effective configuration");

    match args.command {
        Command::Build {
            offline,
            output,
            open,
        } => {
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let state = build(&config, offline, &output_dir, open).await?;
            if state.status() == GalleryStatus::Error {
                std::process::exit(1);
            }
        }
        Command::Audit { output } => {
            let dir = output.unwrap_or_else(|| config.output_dir.join("audit"));
            run_audit(&config, &dir).await?;
        }
    }

    Ok(())
}

async fn build(
    config: &Config,
    offline: bool,
    output_dir: &Path,
    open_page: bool,
) -> Result<GalleryViewState> {
    let mut page = match &config.template_path {
        Some(path) => HtmlPage::load(path)
            .await
            .with_context(|| format!("Failed to read page template: {}", path.display()))?,
        None => HtmlPage::with_default_template(),
    };

    let state = if offline {
        let cache_path = config
            .cache_path
            .as_deref()
            .context("--offline needs `cache_path` set in the config file")?;
        let source = CachedSource::new(MetadataCache::new(open_cache(cache_path).await?));
        Bootstrap::new(&config.curated_path, source)
            .with_allow_list(config.allow_list())
            .with_description_limit(config.description_limit)
            .run(&mut page)
            .await?
    } else {
        let client = ApiClient::new(config.api_config()).context("Failed to create API client")?;
        let bootstrap = Bootstrap::new(&config.curated_path, client)
            .with_allow_list(config.allow_list())
            .with_description_limit(config.description_limit);

        let cache = match config.cache_path.as_deref() {
            Some(path) => match open_cache(path).await {
                Ok(db) => Some(db),
                Err(e) => {
                    tracing::warn!(error = ?e, "Metadata cache unavailable, continuing without it");
                    None
                }
            },
            None => None,
        };
        match cache {
            Some(db) => {
                bootstrap
                    .with_cache(MetadataCache::new(db))
                    .run(&mut page)
                    .await?
            }
            None => bootstrap.run(&mut page).await?,
        }
    };

    let index = output_dir.join("index.html");
    page.write_to(&index)
        .await
        .with_context(|| format!("Failed to write gallery page: {}", index.display()))?;

    let message = state.message();
    println!("{}: {}", message.title, message.body);
    println!("Wrote {}", index.display());

    if open_page {
        if let Err(e) = open::that(&index) {
            tracing::warn!(path = %index.display(), error = %e, "Failed to open gallery page");
        }
    }

    Ok(state)
}

async fn run_audit(config: &Config, dir: &Path) -> Result<()> {
    let entries = load_curated(&config.curated_path).await?;
    let client = ApiClient::new(config.api_config()).context("Failed to create API client")?;

    match audit::run_audit(&client, &entries, dir).await? {
        Some(path) => println!("Audit results saved to {}", path.display()),
        None => println!("No podcasts configured; audit skipped."),
    }
    Ok(())
}

async fn open_cache(path: &Path) -> Result<Database> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in cache path"))?;
    match Database::open(path_str).await {
        Ok(db) => Ok(db),
        Err(DatabaseError::InstanceLocked) => Err(anyhow::anyhow!(
            "The metadata cache at {} is locked by another process",
            path.display()
        )),
        Err(e) => Err(e).with_context(|| format!("Failed to open metadata cache: {}", path.display())),
    }
}
