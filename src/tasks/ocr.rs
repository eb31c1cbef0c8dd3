//! OCR stage: extract structured menus from captured images via Gemini.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::config::SiteConfig;
use crate::llm::{GeminiClient, GeminiConfig, GEMINI_API_KEY_VAR};
use crate::models::{ErrorResult, OcrResult, OcrTaskInput, OcrTaskOutput, Restaurant};
use crate::utils::{parallel_process, retry_with_backoff};

use super::{partition_outcomes, require_env, STAGE_CONCURRENCY};

/// Extensions the capture and download stages produce, in lookup order.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

const OCR_PROMPT: &str = "Extract restaurant daily menus from the image. \
    The texts are in Czech or English language. The input is either a screenshot \
    of a webpage or a photo of a handwritten menu; it can contain spelling errors. \
    Ignore any text not related to the menu.";

// Gemini throttles bursts; a couple of spaced retries ride out the 429s.
const OCR_MAX_RETRIES: u32 = 2;
const OCR_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Run menu extraction for every restaurant that has an image in
/// `input.in_dir`, tagging the output with the target date.
///
/// A missing image is a per-restaurant error (its capture presumably failed
/// upstream), not a fatal one.
pub async fn ocr_task(input: &OcrTaskInput) -> anyhow::Result<OcrTaskOutput> {
    let config = SiteConfig::load(&input.site_config_file)?;
    let api_key = require_env(GEMINI_API_KEY_VAR)?;
    let client = GeminiClient::new(api_key, GeminiConfig::from_env())?;

    let outcomes = parallel_process(config.restaurants, STAGE_CONCURRENCY, |site| {
        let client = &client;
        let in_dir = input.in_dir.as_path();
        async move {
            let id = site.id.clone();
            extract_site_menu(client, &site, in_dir)
                .await
                .map(|data| OcrResult { id: id.clone(), data })
                .map_err(|e| ErrorResult::new(id, format!("{e:#}")))
        }
    })
    .await;

    let (results, errors) = partition_outcomes(outcomes);
    info!(
        "OCR task finished for {}: {} extracted, {} failed",
        input.date,
        results.len(),
        errors.len()
    );
    Ok(OcrTaskOutput {
        results,
        errors,
        date: input.date,
    })
}

async fn extract_site_menu(
    client: &GeminiClient,
    site: &Restaurant,
    in_dir: &Path,
) -> anyhow::Result<crate::models::ParsedMenu> {
    let (path, mime_type) = find_image(in_dir, &site.id)
        .ok_or_else(|| anyhow::anyhow!("no image found for '{}' in {}", site.id, in_dir.display()))?;
    let image = std::fs::read(&path)?;

    info!("Running OCR for {} ({})", site.id, path.display());
    let menu = retry_with_backoff(OCR_MAX_RETRIES, OCR_RETRY_DELAY, 2.0, || {
        client.extract_menu(&image, mime_type, OCR_PROMPT)
    })
    .await?;
    Ok(menu)
}

/// Locate `<in_dir>/<id>.<ext>` for the known image extensions.
fn find_image(in_dir: &Path, id: &str) -> Option<(PathBuf, &'static str)> {
    IMAGE_EXTENSIONS.iter().find_map(|(ext, mime)| {
        let path = in_dir.join(format!("{id}.{ext}"));
        path.is_file().then_some((path, *mime))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_image_prefers_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bistro.png"), b"png").unwrap();
        std::fs::write(tmp.path().join("bistro.jpeg"), b"jpeg").unwrap();

        let (path, mime) = find_image(tmp.path(), "bistro").unwrap();
        assert!(path.ends_with("bistro.jpeg"));
        assert_eq!(mime, "image/jpeg");
    }

    #[test]
    fn test_find_image_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_image(tmp.path(), "bistro").is_none());
    }
}
