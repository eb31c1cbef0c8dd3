//! End-to-end pipeline: screenshot -> OCR -> summary -> upload.
//!
//! Strictly sequential. Per-restaurant errors surfaced by a stage are logged
//! as warnings and the run continues: a partial run still produces whatever
//! summary the successful captures allow. Only stage-level failures (bad
//! config, missing credentials, unwritable artifacts) abort the sequence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::models::{
    ImageFormat, OcrTaskInput, ScreenshotTaskInput, SlackUploadTaskInput, SummaryTaskInput,
};
use crate::tasks::{ocr_task, screenshot_task, slack_upload_task, summary_task};

/// Artifact locations and parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub site_config_file: PathBuf,
    pub screenshots_dir: PathBuf,
    pub ocr_output_file: PathBuf,
    pub summary_output_file: PathBuf,
    pub date: NaiveDate,
    /// Channel to publish the summary to; `None` skips the upload stage.
    pub channel_id: Option<String>,
}

/// Run the complete pipeline for one day.
pub async fn run_pipeline(options: &PipelineOptions) -> anyhow::Result<()> {
    info!("Taking screenshots...");
    let screenshot_result = screenshot_task(&ScreenshotTaskInput {
        site_config_file: options.site_config_file.clone(),
        out_dir: options.screenshots_dir.clone(),
        format: ImageFormat::Jpeg,
        quality: Some(90),
    })
    .await?;
    warn_stage_errors("Screenshot", &screenshot_result.errors);

    info!("Running OCR...");
    let ocr_result = ocr_task(&OcrTaskInput {
        site_config_file: options.site_config_file.clone(),
        in_dir: options.screenshots_dir.clone(),
        date: options.date,
    })
    .await?;
    warn_stage_errors("OCR", &ocr_result.errors);

    write_text(
        &options.ocr_output_file,
        &serde_json::to_string_pretty(&ocr_result)?,
    )?;

    info!("Generating summary...");
    let summary_result = summary_task(&SummaryTaskInput {
        site_config_file: options.site_config_file.clone(),
        ocr_output_file: options.ocr_output_file.clone(),
    })
    .await?;
    debug!("Summary reasoning:\n{}", summary_result.summary.reasoning);

    write_text(&options.summary_output_file, &summary_result.summary.text)?;
    info!("Summary saved to {}", options.summary_output_file.display());

    let Some(channel_id) = options.channel_id.as_deref() else {
        info!("No channel configured, skipping upload");
        return Ok(());
    };

    info!("Uploading summary to Slack...");
    let upload_result = slack_upload_task(&SlackUploadTaskInput {
        site_config_file: options.site_config_file.clone(),
        channel_id: channel_id.to_string(),
        summary_file: options.summary_output_file.clone(),
    })
    .await?;

    // Delivery is the run's whole point; a reported failure fails the run.
    if let Some(error) = upload_result.error {
        anyhow::bail!("summary upload failed: {error}");
    }
    info!("Pipeline finished");
    Ok(())
}

fn warn_stage_errors(stage: &str, errors: &[crate::models::ErrorResult]) {
    for error in errors {
        warn!("{} error for '{}': {}", stage, error.id, error.error);
    }
}

fn write_text(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))
}
