//! Download stage: fetch the newest menu photo from each Slack-sourced
//! restaurant's channel.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use crate::config::SiteConfig;
use crate::models::{
    ErrorResult, Restaurant, ScreenshotResult, SlackDownloadTaskInput, SlackDownloadTaskOutput,
};
use crate::slack::{attachment_lookback, SlackClient, SLACK_BOT_TOKEN_VAR};
use crate::utils::parallel_process;

use super::{ensure_out_dir, partition_outcomes, require_env, STAGE_CONCURRENCY};

/// Download the most recent image posted within the lookback window to each
/// `slack://` restaurant's channel, written as `<id>.<original-extension>`.
pub async fn slack_download_task(
    input: &SlackDownloadTaskInput,
) -> anyhow::Result<SlackDownloadTaskOutput> {
    let config = SiteConfig::load(&input.site_config_file)?;
    let sites: Vec<_> = config
        .restaurants
        .into_iter()
        .filter(|r| r.is_slack())
        .collect();

    ensure_out_dir(&input.out_dir)?;

    let token = require_env(SLACK_BOT_TOKEN_VAR)?;
    let client = SlackClient::new(token)?;

    let outcomes = parallel_process(sites, STAGE_CONCURRENCY, |site| {
        let client = &client;
        let out_dir = input.out_dir.as_path();
        async move {
            let id = site.id.clone();
            download_site_photo(client, &site, out_dir)
                .await
                .map(|path| ScreenshotResult { id: id.clone(), path })
                .map_err(|e| ErrorResult::new(id, format!("{e:#}")))
        }
    })
    .await;

    let (results, errors) = partition_outcomes(outcomes);
    info!(
        "Slack download finished: {} fetched, {} failed",
        results.len(),
        errors.len()
    );
    Ok(SlackDownloadTaskOutput { results, errors })
}

async fn download_site_photo(
    client: &SlackClient,
    site: &Restaurant,
    out_dir: &Path,
) -> anyhow::Result<std::path::PathBuf> {
    let channel = site
        .slack_channel()
        .context("restaurant url is not slack-sourced")?;

    info!("{} - fetching newest photo from channel {}", site.id, channel);
    let oldest = Utc::now() - attachment_lookback();
    let attachment = client.latest_attachment(channel, oldest).await?;

    let bytes = client.download_file(&attachment.download_url).await?;
    let out_file = out_dir.join(format!("{}.{}", site.id, attachment.extension));
    std::fs::write(&out_file, &bytes)
        .with_context(|| format!("failed to write {}", out_file.display()))?;

    info!("{} - saved menu photo to {}", site.id, out_file.display());
    Ok(out_file)
}
