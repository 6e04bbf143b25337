use anyhow::{Context, Result};
use clap::Parser;
use feedme::config::Config;
use feedme::feed::{parse_feed_urls, Aggregator, HtmlRenderer, SourceErrorPolicy};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Get the config directory path (~/.config/feedme/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedme"))
}

#[derive(Parser, Debug)]
#[command(
    name = "feedme",
    about = "Stream many RSS feeds as one HTML list, items first-come first-served"
)]
struct Args {
    /// Feed URLs to aggregate (defaults to the configured or built-in list)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Config file (defaults to ~/.config/feedme/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write HTML to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Render failed feeds as error entries instead of leaving them out
    #[arg(long)]
    inline_errors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only HTML
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let urls = if args.urls.is_empty() {
        config.feed_urls()
    } else {
        parse_feed_urls(&args.urls.join("\n"), config.host_policy())
    };

    let mut options = config.aggregate_options();
    if args.inline_errors {
        options.source_errors = SourceErrorPolicy::Inline;
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()
        .context("Failed to create HTTP client")?;
    let aggregator = Aggregator::new(client, Arc::new(HtmlRenderer::new()), options);

    let mut out: Box<dyn AsyncWrite + Unpin + Send> = match &args.output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let started = std::time::Instant::now();
    let mut html = Box::pin(aggregator.aggregate_deduplicated(urls));
    let mut tokens = 0usize;

    out.write_all(b"<ul>\n").await.context("Failed to write output")?;
    while let Some(token) = html.next().await {
        out.write_all(token.as_str().as_bytes())
            .await
            .context("Failed to write output")?;
        // Items only span a few tokens; flushing each keeps output live
        out.flush().await.context("Failed to flush output")?;
        tokens += 1;
    }
    out.write_all(b"\n</ul>\n").await.context("Failed to write output")?;
    out.flush().await.context("Failed to flush output")?;

    tracing::info!(
        tokens,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Aggregation finished"
    );
    Ok(())
}
