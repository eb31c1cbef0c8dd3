//! Summary stage: one summarization call over the whole day's extractions.
//!
//! Unlike the fan-out stages this one is single-shot, and its own failure
//! mode is degraded content: a failed summarization call still yields a
//! `DailySummary`, with the error reported in the text.

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::SiteConfig;
use crate::llm::{GeminiClient, GeminiConfig, GEMINI_API_KEY_VAR};
use crate::models::{DailySummary, OcrTaskOutput, SummaryTaskInput, SummaryTaskOutput};
use crate::utils::retry_with_backoff;

use super::require_env;

const SUMMARY_PROMPT_TMPL: &str = "\
Please analyze the following restaurant menus and create a listing.\
- Select only menus for {date} ({day_of_week}). If the menu applies to the whole current week, include it. \
If the menu has no date info, include it.\n\
- Create a listing written in Czech language\n\
- Do not omit any dishes (ignore drinks), but correct spelling and duplicates\n\
- Arrange the information in common format: \
<dish name and description, capitalized first letter, but not all caps> \u{2013} <price> K\u{10d}. \
Omit the price if it is unknown.\n\
- Prefix vegetarian dishes with \u{1f33f} emoji.\n\
- Prefix non-vegetarian dishes with a suitable emoji for given dish. Be creative!\n\
- Use Markdown format: headings, bullet points, etc.\n\
Use `reasoning` field for planning and step-by-step reasoning. \
The input is in YAML format and was automatically extracted by OCR; it can contain errors.\n\n\
Restaurant menus:\n\n\
{menus}";

const SUMMARY_MAX_RETRIES: u32 = 2;
const SUMMARY_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Summarize the day's menus from the OCR artifact.
pub async fn summary_task(input: &SummaryTaskInput) -> anyhow::Result<SummaryTaskOutput> {
    let config = SiteConfig::load(&input.site_config_file)?;

    let ocr_text = std::fs::read_to_string(&input.ocr_output_file).with_context(|| {
        format!("cannot read OCR output {}", input.ocr_output_file.display())
    })?;
    let ocr_output: OcrTaskOutput = serde_json::from_str(&ocr_text).with_context(|| {
        format!("malformed OCR output {}", input.ocr_output_file.display())
    })?;

    // Composite document: restaurant name + its extracted menu blocks.
    let mut menus = Vec::new();
    for result in &ocr_output.results {
        match config.get(&result.id) {
            Some(restaurant) => menus.push(json!({
                "name": restaurant.name,
                "menus": result.data.daily_menus,
            })),
            // Stale artifact from an older site config; nothing to title it with.
            None => warn!("OCR result for unknown restaurant id '{}', skipping", result.id),
        }
    }

    if menus.is_empty() {
        info!("No menus to summarize for {}", ocr_output.date);
        return Ok(SummaryTaskOutput {
            summary: DailySummary {
                reasoning: String::new(),
                text: "No menus available for analysis.".to_string(),
            },
            date: ocr_output.date,
        });
    }

    let api_key = require_env(GEMINI_API_KEY_VAR)?;
    let client = GeminiClient::new(api_key, GeminiConfig::from_env())?;
    let prompt = summary_prompt(ocr_output.date, &menus)?;

    let summary = match retry_with_backoff(SUMMARY_MAX_RETRIES, SUMMARY_RETRY_DELAY, 2.0, || {
        client.summarize(&prompt)
    })
    .await
    {
        Ok(summary) => summary,
        Err(e) => {
            error!("Failed to generate summary: {}", e);
            DailySummary {
                reasoning: String::new(),
                text: format!("Error generating summary: {e}"),
            }
        }
    };

    Ok(SummaryTaskOutput {
        summary,
        date: ocr_output.date,
    })
}

/// Render the summarization prompt: target date, English weekday name, and
/// the menus as one YAML document per restaurant.
fn summary_prompt(date: NaiveDate, menus: &[serde_json::Value]) -> anyhow::Result<String> {
    let menus_text = menus
        .iter()
        .map(|menu| serde_yaml::to_string(menu).map_err(anyhow::Error::from))
        .collect::<anyhow::Result<Vec<_>>>()?
        .join("\n");

    Ok(SUMMARY_PROMPT_TMPL
        .replace("{date}", &date.to_string())
        .replace("{day_of_week}", weekday_name(date))
        .replace("{menus}", &menus_text))
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn write_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_summary_prompt_contents() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let menus = vec![json!({
            "name": "U Kotvy",
            "menus": [{"date": {"kind": "whole_week"},
                       "dishes": [{"name": "Guláš", "vegetarian": false}]}],
        })];
        let prompt = summary_prompt(date, &menus).unwrap();
        assert!(prompt.contains("2026-08-28"));
        assert!(prompt.contains("(Friday)"));
        assert!(prompt.contains("U Kotvy"));
        assert!(prompt.contains("Guláš"));
        assert!(!prompt.contains("{menus}"));
    }

    #[tokio::test]
    async fn test_no_menus_returns_placeholder_without_api() {
        let tmp = tempfile::tempdir().unwrap();
        let sites = write_file(
            tmp.path(),
            "sites.yaml",
            "restaurants:\n  - {id: bistro, name: Bistro, url: 'https://bistro.example'}\n",
        );
        let ocr = write_file(
            tmp.path(),
            "ocr.json",
            r#"{"results": [], "errors": [{"id": "bistro", "error": "capture failed"}],
                "date": "2026-08-28"}"#,
        );

        // No GEMINI_API_KEY in the environment: the empty path must not need it.
        let output = summary_task(&SummaryTaskInput {
            site_config_file: sites,
            ocr_output_file: ocr,
        })
        .await
        .unwrap();

        assert_eq!(output.summary.text, "No menus available for analysis.");
        assert_eq!(output.date, NaiveDate::from_ymd_opt(2026, 8, 28).unwrap());
    }

    #[tokio::test]
    async fn test_malformed_ocr_artifact_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let sites = write_file(
            tmp.path(),
            "sites.yaml",
            "restaurants:\n  - {id: bistro, name: Bistro, url: 'https://bistro.example'}\n",
        );
        let ocr = write_file(tmp.path(), "ocr.json", "not json at all");

        let err = summary_task(&SummaryTaskInput {
            site_config_file: sites,
            ocr_output_file: ocr,
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("malformed OCR output"));
    }
}
