//! CLI commands implementation.
//!
//! One subcommand per stage plus `pipeline`; each builds the stage's input
//! record and reports the outcome. Exit behavior: nonzero on fatal
//! preconditions and on a reported upload error, zero with warnings when only
//! per-restaurant operations failed.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use console::style;

use crate::models::{
    ErrorResult, ImageFormat, OcrTaskInput, ScreenshotTaskInput, SlackDownloadTaskInput,
    SlackUploadTaskInput, SummaryTaskInput,
};
use crate::pipeline::{run_pipeline, PipelineOptions};
use crate::tasks::{
    ocr_task, screenshot_task, slack_download_task, slack_upload_task, summary_task,
};

#[derive(Parser)]
#[command(name = "menubot")]
#[command(about = "Daily restaurant menu pipeline: screenshot, OCR, summary, Slack")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Take screenshots of restaurant menu pages
    Screenshot {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Directory to store screenshots
        #[arg(long)]
        out_dir: PathBuf,
        /// Format of the output image
        #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
        format: ImageFormat,
        /// Quality of the output image (1-100). Applied only for jpeg
        #[arg(long)]
        quality: Option<u8>,
    },

    /// Extract structured menus from captured images
    Ocr {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Directory containing captured images
        #[arg(long)]
        in_dir: PathBuf,
        /// Path to the OCR output file
        #[arg(long)]
        out_file: PathBuf,
        /// Date to process (YYYY-MM-DD). Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Generate the daily menu summary
    Summary {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Path to the OCR output file
        #[arg(long)]
        ocr_output: PathBuf,
        /// Path to the summary output file
        #[arg(long)]
        out_file: PathBuf,
    },

    /// Upload the menu summary to Slack
    Upload {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Path to the daily menu summary file to upload
        #[arg(long)]
        summary_file: PathBuf,
        /// Slack channel ID to post to
        #[arg(long, env = "SLACK_CHANNEL_ID")]
        channel_id: String,
    },

    /// Download menu photos from Slack channels
    Download {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Directory to store downloaded photos
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Run the complete pipeline: screenshot -> OCR -> summary -> upload
    Pipeline {
        /// Path to YAML file containing restaurant website data
        #[arg(long)]
        sites: PathBuf,
        /// Directory to store screenshots
        #[arg(long)]
        screenshots_dir: PathBuf,
        /// Path to the OCR output file
        #[arg(long)]
        ocr_output: PathBuf,
        /// Path to the summary output file
        #[arg(long)]
        summary_output: PathBuf,
        /// Date to process (YYYY-MM-DD). Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Slack channel ID to publish to; upload is skipped when unset
        #[arg(long, env = "SLACK_CHANNEL_ID")]
        channel_id: Option<String>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Screenshot {
            sites,
            out_dir,
            format,
            quality,
        } => {
            let output = screenshot_task(&ScreenshotTaskInput {
                site_config_file: sites,
                out_dir,
                format,
                quality,
            })
            .await?;
            print_batch_outcome("Captured", output.results.len(), &output.errors);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Ocr {
            sites,
            in_dir,
            out_file,
            date,
        } => {
            let output = ocr_task(&OcrTaskInput {
                site_config_file: sites,
                in_dir,
                date: date.unwrap_or_else(today),
            })
            .await?;
            print_batch_outcome("Extracted", output.results.len(), &output.errors);
            std::fs::write(&out_file, serde_json::to_string_pretty(&output)?)?;
            println!("{} Wrote {}", style("→").cyan(), out_file.display());
        }

        Commands::Summary {
            sites,
            ocr_output,
            out_file,
        } => {
            let output = summary_task(&SummaryTaskInput {
                site_config_file: sites,
                ocr_output_file: ocr_output,
            })
            .await?;
            tracing::debug!("Summary reasoning:\n{}", output.summary.reasoning);
            std::fs::write(&out_file, &output.summary.text)?;
            println!(
                "{} Summary for {} written to {}",
                style("✓").green(),
                output.date,
                out_file.display()
            );
        }

        Commands::Upload {
            sites,
            summary_file,
            channel_id,
        } => {
            let output = slack_upload_task(&SlackUploadTaskInput {
                site_config_file: sites,
                channel_id: channel_id.clone(),
                summary_file,
            })
            .await?;
            if let Some(error) = output.error {
                anyhow::bail!("failed to upload to Slack: {error}");
            }
            println!(
                "{} Posted summary to channel {}",
                style("✓").green(),
                channel_id
            );
        }

        Commands::Download { sites, out_dir } => {
            let output = slack_download_task(&SlackDownloadTaskInput {
                site_config_file: sites,
                out_dir,
            })
            .await?;
            print_batch_outcome("Downloaded", output.results.len(), &output.errors);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Pipeline {
            sites,
            screenshots_dir,
            ocr_output,
            summary_output,
            date,
            channel_id,
        } => {
            run_pipeline(&PipelineOptions {
                site_config_file: sites,
                screenshots_dir,
                ocr_output_file: ocr_output,
                summary_output_file: summary_output,
                date: date.unwrap_or_else(today),
                channel_id,
            })
            .await?;
            println!("{} Pipeline finished", style("✓").green());
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_batch_outcome(verb: &str, ok: usize, errors: &[ErrorResult]) {
    if errors.is_empty() {
        println!("{} {} {} restaurants", style("✓").green(), verb, ok);
    } else {
        println!(
            "{} {} {} restaurants, {} failed",
            style("!").yellow(),
            verb,
            ok,
            errors.len()
        );
        for error in errors {
            tracing::warn!("'{}': {}", error.id, error.error);
        }
    }
}
