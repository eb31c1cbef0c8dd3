//! Screenshot stage: render and capture every web-sourced restaurant page.

use tracing::info;

use crate::config::SiteConfig;
use crate::models::{ErrorResult, ScreenshotResult, ScreenshotTaskInput, ScreenshotTaskOutput};
use crate::scrapers::{capture_site, CaptureConfig};
use crate::utils::parallel_process;

use super::{ensure_out_dir, partition_outcomes, STAGE_CONCURRENCY};

/// Capture one screenshot per web-sourced restaurant into `input.out_dir`,
/// named `<id>.<format>`.
///
/// Restaurants with non-http URLs (Slack-sourced menus) are not this stage's
/// job and are skipped entirely — they appear in neither list.
pub async fn screenshot_task(input: &ScreenshotTaskInput) -> anyhow::Result<ScreenshotTaskOutput> {
    info!(
        "Running screenshot task: sites={} out_dir={} format={}",
        input.site_config_file.display(),
        input.out_dir.display(),
        input.format
    );

    let config = SiteConfig::load(&input.site_config_file)?;
    let sites: Vec<_> = config
        .restaurants
        .into_iter()
        .filter(|r| r.is_web())
        .collect();

    ensure_out_dir(&input.out_dir)?;

    let capture_config = CaptureConfig::default();
    let outcomes = parallel_process(sites, STAGE_CONCURRENCY, |site| {
        let capture_config = &capture_config;
        async move {
            match capture_site(
                capture_config,
                &site,
                &input.out_dir,
                input.format,
                input.quality,
            )
            .await
            {
                Ok(path) => Ok(ScreenshotResult { id: site.id, path }),
                Err(e) => Err(ErrorResult::new(site.id, format!("{e:#}"))),
            }
        }
    })
    .await;

    let (results, errors) = partition_outcomes(outcomes);
    info!(
        "Screenshot task finished: {} captured, {} failed",
        results.len(),
        errors.len()
    );
    Ok(ScreenshotTaskOutput { results, errors })
}
