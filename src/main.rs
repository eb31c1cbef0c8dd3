//! menubot - daily restaurant menu pipeline.
//!
//! Screenshot restaurant menu pages (or fetch menu photos from Slack),
//! extract structured menus with Gemini, summarize the day in Czech, and
//! post the result to a Slack channel.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use menubot::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "menubot=info"
    } else {
        "menubot=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
