//! # Cityprint CLI
//!
//! Command-line interface for the cityprint library.
//! Fetches every building footprint of a city from Overpass and renders
//! the set into a single PNG.

use anyhow::Context;
use cityprint::{
    area_id, check_overwrite_permission, BatchOptions, CityDirectory, DataDir, EndpointConfig,
    FetchOptions, FetchReport, OverpassClient, OverwriteBehavior, RetryOptions, RetryPolicy,
};
use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::time::Duration;

mod cli;

/// Command-line interface for cityprint
#[derive(Parser)]
#[command(name = "cityprint")]
#[command(about = "Renders every building of a city into a single PNG")]
#[command(long_about = "Fetches building footprints from the Overpass API and rasterizes them:
  cityprint 5997314                      # Fetch by OSM relation id, save 5997314.png
  cityprint tbilisi --cities towns.json  # Resolve a name through a city directory
  cityprint 5997314 out.png --width 3840 --height 2160
                                         # Custom output path and canvas size
  cityprint 5997314 --data-dir cache/    # Cache fetched data, reuse it on reruns

File Overwrite Behavior:
  By default, you'll be prompted if destination file exists
  --force                                # Overwrite without asking
  --no-clobber                           # Never overwrite, fail if file exists")]
#[command(version = env!("CITYPRINT_VERSION"))]
struct Cli {
    /// City to render: a name from the --cities directory, or a numeric OSM relation id
    city: String,

    /// Output PNG path (defaults to <city>.png)
    #[arg(default_value = "")]
    output: String,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 15360)]
    width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 8640)]
    height: u32,

    /// Ways per geometry batch
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Ways per retry batch
    #[arg(long, default_value_t = 20)]
    retry_batch_size: usize,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Maximum retry passes over unresolved buildings
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Keep retrying until the unresolved set stops shrinking to zero
    #[arg(long)]
    retry_until_clear: bool,

    /// Pause between retry passes in milliseconds
    #[arg(long, default_value_t = 3000)]
    backoff_ms: u64,

    /// JSON file mapping city names to OSM relation ids
    #[arg(long)]
    cities: Option<PathBuf>,

    /// Directory for cached fetch results (buildings.json, errors.json)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Ignore cached data and fetch fresh
    #[arg(long)]
    refresh: bool,

    /// Enable dry-run mode (show the fetch plan without fetching)
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Force overwrite existing files without prompting
    #[arg(short, long)]
    force: bool,

    /// Never overwrite existing files (fail if destination exists)
    #[arg(long)]
    no_clobber: bool,
}

/// Resolve output path from CLI arguments
fn resolve_output(city: &str, output: &str) -> String {
    if output.is_empty() {
        // Auto-generate filename
        let slug = city
            .trim()
            .to_lowercase()
            .replace(|c: char| c.is_whitespace() || c == '/', "-");
        format!("{slug}.png")
    } else {
        output.to_string()
    }
}

/// Show information about the query target
fn show_fetch_info(relation_id: u64) {
    let endpoint = EndpointConfig::default().interpreter_url;
    eprintln!(
        "🌐 Querying {endpoint} (area {})",
        area_id(relation_id)
    );
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🏙️ Cityprint v{} starting...", env!("CITYPRINT_VERSION"));
    }

    // Validate conflicting flags
    if cli.force && cli.no_clobber {
        eprintln!("❌ Error: --force and --no-clobber cannot be used together");
        std::process::exit(1);
    }

    // Resolve the city before anything touches the network
    let directory = match &cli.cities {
        Some(path) => CityDirectory::from_file(path)
            .with_context(|| format!("Failed to load city directory from {}", path.display()))?,
        None => CityDirectory::new(),
    };
    let relation_id = directory.resolve(&cli.city)?;

    let output_path = resolve_output(&cli.city, &cli.output);

    if cli.dry_run {
        let city = &cli.city;
        let endpoint = EndpointConfig::default().interpreter_url;
        eprintln!(
            "🔍 [DRY RUN] Would fetch '{city}' (relation {relation_id}, area {})",
            area_id(relation_id)
        );
        eprintln!("🔍 [DRY RUN] Endpoint: {endpoint}");
        eprintln!(
            "🔍 [DRY RUN] Batches of {} every {}ms, retry batches of {} ({})",
            cli.batch_size,
            cli.delay_ms,
            cli.retry_batch_size,
            if cli.retry_until_clear {
                "until clear".to_string()
            } else {
                format!("{} passes", cli.retries)
            }
        );
        eprintln!(
            "🔍 [DRY RUN] Would render {}x{} PNG to {output_path}",
            cli.width, cli.height
        );
        return Ok(());
    }

    // Ask about the destination before the long fetch, not after it
    let overwrite = if cli.force {
        OverwriteBehavior::Force
    } else if cli.no_clobber {
        OverwriteBehavior::NeverOverwrite
    } else {
        OverwriteBehavior::Prompt
    };
    check_overwrite_permission(&output_path, &overwrite)?;

    eprintln!("📁 Saving to: {output_path}");

    let report = obtain_report(&cli, relation_id).await?;

    eprintln!(
        "🏢 Resolved {} of {} listed buildings",
        report.buildings.len(),
        report.listed
    );
    if !report.unresolved.is_empty() {
        eprintln!(
            "⚠️ {} buildings stayed unresolved after {} retry passes",
            report.unresolved.len(),
            report.retry_attempts
        );
    }

    eprintln!("🖼️ Rendering {}x{} canvas...", cli.width, cli.height);
    let png = cityprint::render_png(&report.buildings, cli.width, cli.height)?;
    std::fs::write(&output_path, &png)
        .with_context(|| format!("Failed to write {output_path}"))?;

    eprintln!("✅ Saved {output_path}");

    Ok(())
}

/// Fetch a city report, going through the data directory cache when one is configured
async fn obtain_report(cli: &Cli, relation_id: u64) -> anyhow::Result<FetchReport> {
    let data_dir = cli.data_dir.as_ref().map(DataDir::new);

    if let Some(dir) = &data_dir {
        if dir.has_buildings() && !cli.refresh {
            eprintln!(
                "📦 Using cached buildings from {}",
                dir.buildings_path().display()
            );
            let buildings = dir
                .load_buildings()
                .context("Failed to load cached buildings")?;
            let unresolved = dir.load_errors().context("Failed to load cached errors")?;
            let listed = buildings.len() + unresolved.len();
            return Ok(FetchReport {
                buildings,
                unresolved,
                listed,
                retry_attempts: 0,
            });
        }
    }

    if cli.verbose {
        // Show query target information
        show_fetch_info(relation_id);
    }

    let options = build_fetch_options(cli);
    let client = OverpassClient::new();
    let report = cityprint::fetch_city_with_client(&client, relation_id, &options).await?;

    if let Some(dir) = &data_dir {
        dir.save(&report.buildings, &report.unresolved)
            .context("Failed to write data directory")?;
        eprintln!(
            "📦 Cached {} buildings to {}",
            report.buildings.len(),
            dir.buildings_path().display()
        );
    }

    Ok(report)
}

/// Build fetch options from CLI flags, with a progress bar wired to batch completion
fn build_fetch_options(cli: &Cli) -> FetchOptions {
    let progress_manager = cli::ProgressManager::new(
        0,
        &format!("🌐 Fetching buildings for {}", cli.city),
    );

    FetchOptions {
        batch: BatchOptions {
            batch_size: cli.batch_size,
            delay: Duration::from_millis(cli.delay_ms),
            progress: Some(std::sync::Arc::new({
                let pb = progress_manager.pb.clone();
                move |completed, total| {
                    if pb.length().unwrap_or(0) != total {
                        pb.set_length(total);
                    }
                    pb.set_position(completed);
                    if completed >= total {
                        pb.finish_with_message("✅ Fetch completed!");
                    }
                }
            })),
        },
        retry: RetryOptions {
            policy: if cli.retry_until_clear {
                RetryPolicy::UntilExhausted
            } else {
                RetryPolicy::Bounded(cli.retries)
            },
            batch: BatchOptions {
                batch_size: cli.retry_batch_size,
                delay: Duration::from_millis(cli.delay_ms),
                progress: None,
            },
            backoff: Duration::from_millis(cli.backoff_ms),
        },
    }
}
