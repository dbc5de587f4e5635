//! VidCollector main entry point
//!
//! This is the command-line interface for the VidCollector Farsi video
//! discovery crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vidcollector::config::{load_config_with_hash, validate_seeds, Config};
use vidcollector::crawler::Coordinator;
use vidcollector::output::{
    export, load_statistics, print_run_stats, print_statistics, ExportFormat, ExportTable,
};
use vidcollector::storage::SqliteStore;

/// VidCollector: a Farsi video discovery crawler
///
/// VidCollector walks related-video links from seed pages, keeps the videos
/// whose metadata is Farsi, stores them and collects their caption tracks.
#[derive(Parser, Debug)]
#[command(name = "vidcollector")]
#[command(version = "1.0.0")]
#[command(about = "A Farsi video discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl from seed videos and ingest what is found
    Crawl {
        /// Seed video URL (repeatable); replaces the configured seeds
        #[arg(long = "seed", value_name = "URL")]
        seeds: Vec<String>,

        /// Stop after this many accepted videos
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,

        /// Store metadata only, skip caption retrieval
        #[arg(long)]
        no_download: bool,

        /// Maximum concurrent caption retrievals
        #[arg(long, value_name = "K")]
        concurrency: Option<usize>,

        /// Run one crawler per seed in parallel
        #[arg(long)]
        per_seed: bool,

        /// Validate config and show what would be crawled without crawling
        #[arg(long)]
        dry_run: bool,
    },

    /// Retry caption retrieval for stored videos that lack captions
    ResumeCaptions {
        /// Retry at most this many videos
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,
    },

    /// Show statistics from the database and exit
    Stats,

    /// Export stored videos and captions
    Export {
        /// Output format: json or csv
        #[arg(long)]
        format: ExportFormat,

        /// Output file
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Table to export: items, captions or all
        #[arg(long, default_value = "items")]
        table: ExportTable,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Crawl {
            seeds,
            max_items,
            no_download,
            concurrency,
            per_seed,
            dry_run,
        } => {
            let mut config = config;
            let seeds = if seeds.is_empty() {
                config.seeds.clone()
            } else {
                validate_seeds(&seeds)?;
                seeds
            };
            apply_overrides(&mut config, max_items, no_download, concurrency, per_seed)?;

            if dry_run {
                handle_dry_run(&config, &seeds);
            } else {
                handle_crawl(config, config_hash, seeds).await?;
            }
        }
        Command::ResumeCaptions { max_items } => {
            let limit = max_items.unwrap_or(config.crawler.max_items);
            handle_resume_captions(config, config_hash, limit).await?;
        }
        Command::Stats => handle_stats(&config)?,
        Command::Export {
            format,
            output,
            table,
        } => handle_export(&config, format, table, &output)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vidcollector=info,warn"),
            1 => EnvFilter::new("vidcollector=debug,info"),
            2 => EnvFilter::new("vidcollector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the configuration file
fn apply_overrides(
    config: &mut Config,
    max_items: Option<usize>,
    no_download: bool,
    concurrency: Option<usize>,
    per_seed: bool,
) -> anyhow::Result<()> {
    if let Some(max_items) = max_items {
        if max_items < 1 {
            bail!("--max-items must be >= 1");
        }
        config.crawler.max_items = max_items;
    }
    if let Some(concurrency) = concurrency {
        if concurrency < 1 {
            bail!("--concurrency must be >= 1");
        }
        config.ingest.concurrency = concurrency;
    }
    if no_download {
        config.ingest.download_content = false;
    }
    if per_seed {
        config.crawler.per_seed = true;
    }
    Ok(())
}

/// Handles `crawl --dry-run`: shows what would be crawled
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== VidCollector Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max items: {}", config.crawler.max_items);
    println!("  Max queue size: {}", config.crawler.max_queue_size);
    match config.crawler.max_steps {
        Some(steps) => println!("  Max steps: {}", steps),
        None => println!("  Max steps: unlimited"),
    }
    println!("  Rate limit delay: {}ms", config.crawler.rate_limit_delay);
    println!("  One crawler per seed: {}", config.crawler.per_seed);

    println!("\nClassifier:");
    println!("  Target language: {}", config.classifier.target_language);
    println!("  Min ratio: {}", config.classifier.min_ratio);
    println!("  Pre-filter ratio: {}", config.classifier.prefilter_ratio);
    println!("  Statistical detector: {}", config.classifier.use_detector);

    println!("\nIngestion:");
    println!("  Download captions: {}", config.ingest.download_content);
    println!("  Concurrency: {}", config.ingest.concurrency);
    println!(
        "  Caption languages: {}",
        config.ingest.caption_languages.join(", ")
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Mapping log: {}", config.output.mapping_path);
    println!("  Downloads: {}", config.output.download_dir);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, seeds: Vec<String>) -> anyhow::Result<()> {
    if seeds.is_empty() {
        bail!("No seeds given: pass --seed or set `seeds` in the configuration");
    }
    tracing::info!("Total seed URLs: {}", seeds.len());

    let coordinator = Coordinator::new(config, config_hash)?;
    let summary = coordinator.run(&seeds).await?;

    print_run_stats(&summary.stats);
    if summary.timed_out {
        println!(
            "\nSession {} stopped at the run timeout; partial results were kept.",
            summary.session_id
        );
    }
    Ok(())
}

/// Handles `resume-captions`
async fn handle_resume_captions(config: Config, config_hash: String, limit: usize) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config, config_hash)?;
    let stats = coordinator.resume_captions(limit).await;
    print_run_stats(&stats);
    Ok(())
}

/// Handles `stats`: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(
        &store,
        &config.ingest.caption_languages,
        Path::new(&config.output.mapping_path),
    )?;

    print_statistics(&stats);
    Ok(())
}

/// Handles `export`
fn handle_export(
    config: &Config,
    format: ExportFormat,
    table: ExportTable,
    output: &Path,
) -> anyhow::Result<()> {
    let store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let summary = export(&store, format, table, output)?;

    for file in &summary.files {
        println!("✓ Exported to: {}", file.display());
    }
    println!("  {} items, {} captions", summary.items, summary.captions);
    Ok(())
}
