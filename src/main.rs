use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadscan::bus::Message;
use leadscan::classifier::Classifier;
use leadscan::config::Config;
use leadscan::corpus::KeywordCorpus;
use leadscan::llm::GeminiClient;
use leadscan::models::PostRecord;
use leadscan::storage::{DetectionStore, JsonFileStore};
use leadscan::surface::{BrowsingSurface, HttpSurface, Page, SnapshotSurface};
use leadscan::system::System;

#[derive(Parser)]
#[command(
    name = "leadscan",
    version,
    about = "Keyword-driven feed scanner that surfaces hiring-opportunity posts",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the keyword corpus and print every hiring post found
    Scan {
        /// Serve pages from saved HTML snapshots instead of the network
        #[arg(short, long)]
        snapshots: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Scan a single page (URL or saved HTML file)
    ScanPage {
        /// Page URL or path to an HTML file
        target: String,

        /// Keep watching the page until interrupted
        #[arg(short, long, default_value = "false")]
        watch: bool,
    },

    /// Classify a piece of text
    Classify {
        /// Post text
        text: String,
    },

    /// Show detection statistics
    Stats {
        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Clear the detection count and history
    ResetStats,

    /// Enable passive scanning
    Enable,

    /// Disable passive scanning
    Disable,

    /// List the search keyword corpus
    Keywords,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, cli.verbose, &config.logging.level)?;

    tracing::debug!("leadscan starting");

    match cli.command {
        Commands::Scan { snapshots, json } => {
            tracing::info!(snapshots = ?snapshots, "Starting scan command");
            scan(&config, snapshots, json).await?;
        }

        Commands::ScanPage { target, watch } => {
            tracing::info!(target = %target, watch = %watch, "Starting scan-page command");
            scan_page(&config, &target, watch).await?;
        }

        Commands::Classify { text } => classify(&config, &text).await?,

        Commands::Stats { json } => stats(&config, json).await?,

        Commands::ResetStats => {
            open_store(&config).await?.reset().await?;
            println!("Statistics reset");
        }

        Commands::Enable => set_enabled(&config, true).await?,

        Commands::Disable => set_enabled(&config, false).await?,

        Commands::Keywords => {
            for (i, keyword) in KeywordCorpus::default().iter().enumerate() {
                println!("{:>2}. {keyword}", i + 1);
            }
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool, level: &str) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("leadscan=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("leadscan={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn build_classifier(config: &Config) -> Result<Classifier> {
    let classifier = Classifier::new();
    if config.classifier.api_key.is_none() {
        return Ok(classifier);
    }

    let client = GeminiClient::from_config(&config.classifier)
        .context("Failed to create classifier client")?;
    Ok(classifier.with_analyzer(Arc::new(client)))
}

async fn open_store(config: &Config) -> Result<JsonFileStore> {
    let path = &config.storage.path;
    JsonFileStore::open(path, config.scanner.history_cap)
        .await
        .with_context(|| format!("Failed to open detection store: {}", path.display()))
}

fn build_surface(config: &Config, snapshots: Option<PathBuf>) -> Result<Arc<dyn BrowsingSurface>> {
    Ok(match snapshots {
        Some(dir) => Arc::new(SnapshotSurface::new(dir)),
        None => Arc::new(HttpSurface::from_config(&config.scanner)?),
    })
}

async fn scan(config: &Config, snapshots: Option<PathBuf>, json: bool) -> Result<()> {
    let store = Arc::new(open_store(config).await?);
    let system = System::spawn(
        config,
        KeywordCorpus::default(),
        build_surface(config, snapshots)?,
        store,
        build_classifier(config)?,
    );
    let mut events = system.subscribe();

    let ack = system.start_auto_scan().await?;
    if !ack.success {
        anyhow::bail!("Auto-scan refused: {}", ack.error.unwrap_or_default());
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(Message::ScanComplete { count }) => {
                    tracing::info!(count, "Scan complete");
                    break;
                }
                Ok(_) => {}
                Err(e) => anyhow::bail!("Coordinator went away: {e}"),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, stopping auto-scan");
                system.stop_auto_scan().await?;
                break;
            }
        }
    }

    let status = system.scan_status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status.collected_posts)?);
    } else {
        println!("Progress: {}", status.progress);
        println!("Collected {} posts", status.collected_count);
        for post in &status.collected_posts {
            print_post(post);
        }
    }

    system.shutdown().await;
    Ok(())
}

async fn load_page(config: &Config, target: &str) -> Result<Page> {
    let path = Path::new(target);
    if path.is_file() {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Page {
            url: format!("file://{}", path.display()),
            html,
        });
    }

    let surface = HttpSurface::from_config(&config.scanner)?;
    let handle = surface.open().await?;
    Ok(surface.navigate(handle, target).await?)
}

async fn scan_page(config: &Config, target: &str, watch: bool) -> Result<()> {
    let store = Arc::new(open_store(config).await?);
    if watch && !store.stats().await?.enabled {
        anyhow::bail!("Scanning is disabled; run `leadscan enable` first");
    }

    let page = load_page(config, target).await?;
    let before = store.stats().await?.detected_count;

    let system = System::spawn(
        config,
        KeywordCorpus::default(),
        Arc::new(SnapshotSurface::new(".")),
        Arc::clone(&store) as Arc<dyn DetectionStore>,
        build_classifier(config)?,
    );
    system.show_page(page);

    let ack = system.manual_scan().await?;
    if !ack.success {
        anyhow::bail!("Manual scan failed: {}", ack.error.unwrap_or_default());
    }

    if watch {
        tracing::info!("Watching page, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
    }

    let stats = system.stats().await?;
    let new = usize::try_from(stats.detected_count.saturating_sub(before)).unwrap_or(usize::MAX);
    println!("Found {new} hiring posts");
    for post in stats.recent_detections.iter().take(new) {
        print_post(post);
    }

    system.shutdown().await;
    Ok(())
}

async fn classify(config: &Config, text: &str) -> Result<()> {
    let verdict = build_classifier(config)?.classify(text).await;
    println!("Hiring lead: {}", if verdict.is_lead { "yes" } else { "no" });
    if let Some(keyword) = verdict.matched_keyword {
        println!("Matched keyword: {keyword}");
    }
    if let Some(analysis) = verdict.analysis {
        println!(
            "AI analysis: hiring={} confidence={:.2} summary={}",
            analysis.is_hiring, analysis.confidence, analysis.summary
        );
    }
    Ok(())
}

async fn stats(config: &Config, json: bool) -> Result<()> {
    let stats = open_store(config).await?.stats().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Detected: {}", stats.detected_count);
    println!("Enabled: {}", stats.enabled);
    for post in &stats.recent_detections {
        print_post(post);
    }
    Ok(())
}

async fn set_enabled(config: &Config, enabled: bool) -> Result<()> {
    open_store(config).await?.set_enabled(enabled).await?;
    println!("Scanning {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn print_post(post: &PostRecord) {
    println!();
    println!("  {}", post.id);
    if let Some(author) = &post.author_name {
        println!("  by {author}");
    }
    if let Some(url) = &post.post_url {
        println!("  {url}");
    }
    println!("  {}", post.preview);
}
