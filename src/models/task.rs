//! Stage task input/output records.
//!
//! One input and one output record per stage. Inputs are built once per
//! invocation (by the CLI or the pipeline) and are immutable; outputs carry
//! the `results`/`errors` partition described in the task module docs.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DailySummary, ErrorResult, OcrResult, ScreenshotResult};

/// Output image format for captured pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension (also the CDP format name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ScreenshotTaskInput {
    pub site_config_file: PathBuf,
    pub out_dir: PathBuf,
    pub format: ImageFormat,
    /// JPEG quality (1-100); ignored for PNG.
    pub quality: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotTaskOutput {
    pub results: Vec<ScreenshotResult>,
    pub errors: Vec<ErrorResult>,
}

#[derive(Debug, Clone)]
pub struct OcrTaskInput {
    pub site_config_file: PathBuf,
    pub in_dir: PathBuf,
    pub date: NaiveDate,
}

/// Written to disk as the OCR artifact consumed by the summary stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrTaskOutput {
    pub results: Vec<OcrResult>,
    pub errors: Vec<ErrorResult>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SummaryTaskInput {
    pub site_config_file: PathBuf,
    pub ocr_output_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTaskOutput {
    pub summary: DailySummary,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SlackUploadTaskInput {
    pub site_config_file: PathBuf,
    pub channel_id: String,
    pub summary_file: PathBuf,
}

/// Delivery outcome. A set `error` is a reported failure, not a panic path;
/// the caller decides severity (the CLI exits nonzero).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackUploadTaskOutput {
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackDownloadTaskInput {
    pub site_config_file: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackDownloadTaskOutput {
    pub results: Vec<ScreenshotResult>,
    pub errors: Vec<ErrorResult>,
}
