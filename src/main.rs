use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedrake::{Config, Database, HttpFetcher, PollScheduler, TracingSink};

#[derive(Parser, Debug)]
#[command(
    name = "feedrake",
    about = "Polls registered syndication feeds on a fixed interval"
)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, value_name = "FILE", default_value = "feedrake.toml")]
    config: PathBuf,

    /// Override the database path from the config
    #[arg(long, value_name = "FILE")]
    db: Option<String>,

    /// Register a feed URL (repeatable), then exit
    #[arg(long = "add-feed", value_name = "URL")]
    add_feed: Vec<String>,

    /// List registered feeds, then exit
    #[arg(long)]
    list_feeds: bool,

    /// Run a single poll cycle instead of the continuous loop
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config).context("failed to load configuration")?;
    if let Some(db_path) = args.db {
        config.db_path = db_path;
    }

    let db = Database::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path))?;

    if !args.add_feed.is_empty() {
        for raw in &args.add_feed {
            let parsed =
                url::Url::parse(raw).with_context(|| format!("invalid feed url: {raw}"))?;
            // The host stands in as the title until someone renames the feed
            let title = parsed.host_str().unwrap_or(raw.as_str()).to_string();
            let id = db.add_feed(raw, &title).await?;
            println!("Added feed {} ({})", id, raw);
        }
        return Ok(());
    }

    if args.list_feeds {
        let feeds = db.all_feeds().await?;
        if feeds.is_empty() {
            println!("No feeds registered. Add one with --add-feed <URL>.");
            return Ok(());
        }
        for feed in feeds {
            let fetched = feed
                .last_fetched
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!(
                "{:>4}  {}  {}  (last fetched: {})",
                feed.id, feed.title, feed.url, fetched
            );
        }
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("feedrake/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let fetcher = HttpFetcher::new(client, config.fetch_timeout());
    let sink = TracingSink;

    let scheduler = PollScheduler::new(config.concurrency, config.interval())?;

    if args.once {
        scheduler.run_cycle(&db, &fetcher, &sink).await;
        return Ok(());
    }

    tokio::select! {
        _ = scheduler.run(&db, &fetcher, &sink) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping poller");
        }
    }

    Ok(())
}
