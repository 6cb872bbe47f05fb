//! Resolve a single URL and print the embed as JSON.
//!
//! Reads `SITE_URL`, `EMBED_FETCH_TIMEOUT_MS` and `EMBED_USER_AGENT` from the
//! environment (or `.env`). Logs go to stderr so stdout stays parseable.

use anyhow::{Context, Result};
use clap::Parser;
use embed::{CardType, EmbedConfig, EmbedResolver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "embed")]
#[command(about = "Resolve a URL into an oEmbed payload or bookmark card")]
struct Cli {
    /// URL to resolve
    url: String,

    /// Requested card type: bookmark or embed
    #[arg(long, default_value_t = CardType::Unspecified)]
    card_type: CardType,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,embed=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config = EmbedConfig::from_env().context("Failed to load configuration")?;
    let resolver = EmbedResolver::new(config);

    let embed = resolver
        .resolve_embed(&cli.url, cli.card_type)
        .await
        .with_context(|| format!("Failed to resolve {}", cli.url))?;

    println!("{}", serde_json::to_string_pretty(&embed)?);

    Ok(())
}
