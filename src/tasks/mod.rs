//! Stage task contracts.
//!
//! Every stage follows the same shape: load and validate the site config
//! (fatal on failure), filter the restaurants it can handle, run the work, and
//! return a `...TaskOutput` whose `results`/`errors` lists partition the
//! attempted restaurants — each attempted id lands in exactly one list. Tasks
//! only return `Err` for preconditions (bad config, unusable output
//! directory, missing credential); per-restaurant failures are data.

mod ocr;
mod screenshot;
mod slack_download;
mod slack_upload;
mod summary;

pub use ocr::ocr_task;
pub use screenshot::screenshot_task;
pub use slack_download::slack_download_task;
pub use slack_upload::slack_upload_task;
pub use summary::summary_task;

use std::path::Path;

use anyhow::Context;

use crate::models::ErrorResult;

/// In-flight limit for per-restaurant fan-out within a stage.
pub const STAGE_CONCURRENCY: usize = 5;

/// Split executor outcomes into the stage output's result/error lists.
pub(crate) fn partition_outcomes<T>(
    outcomes: Vec<Result<T, ErrorResult>>,
) -> (Vec<T>, Vec<ErrorResult>) {
    let mut results = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(error) => errors.push(error),
        }
    }
    (results, errors)
}

/// Create the output directory if needed; fatal if the path is not a directory.
pub(crate) fn ensure_out_dir(out_dir: &Path) -> anyhow::Result<()> {
    if !out_dir.exists() {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("cannot create output directory {}", out_dir.display()))?;
    } else if !out_dir.is_dir() {
        anyhow::bail!("{} is not a directory", out_dir.display());
    }
    Ok(())
}

/// Fetch a required credential from the environment; fatal when missing.
pub(crate) fn require_env(var: &str) -> anyhow::Result<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{var} is not set"))
}
