//! Slack Web API client.
//!
//! Covers the two interactions the pipeline needs: posting the daily summary
//! to a channel, and fetching the newest image attachment posted to a channel
//! (for restaurants that publish their menu as a photo in Slack).

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

const SLACK_API_BASE: &str = "https://slack.com/api";

/// How far back to look for a menu photo in a channel.
pub fn attachment_lookback() -> Duration {
    Duration::hours(24)
}

/// Errors from Slack Web API calls.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("Slack API error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no messages found in channel {0}")]
    NoMessages(String),
    #[error("no file attachment found in channel {0} within the lookback window")]
    NoAttachment(String),
}

/// A downloadable file attachment from a channel message.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub download_url: String,
    /// Extension derived from the attachment's filename or URL.
    pub extension: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
struct HistoryMessage {
    ts: String,
    #[serde(default)]
    files: Vec<HistoryFile>,
}

#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    name: Option<String>,
    url_private_download: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

/// Slack Web API client authenticated with a bot token.
pub struct SlackClient {
    token: String,
    base_url: String,
    client: Client,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| SlackError::Connection(e.to_string()))?;
        Ok(Self {
            token: token.into(),
            base_url: SLACK_API_BASE.to_string(),
            client,
        })
    }

    /// Post Markdown text to a channel.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let body = json!({
            "channel": channel,
            "text": text,
            "blocks": [{"type": "markdown", "text": text}],
        });

        let resp: PostMessageResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Connection(e.to_string()))?
            .json()
            .await
            .map_err(|e| SlackError::Parse(e.to_string()))?;

        if !resp.ok {
            return Err(SlackError::Api(
                resp.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        info!("Posted message to Slack channel {}", channel);
        Ok(())
    }

    /// Find the newest file attachment posted to `channel` since `oldest`.
    pub async fn latest_attachment(
        &self,
        channel: &str,
        oldest: DateTime<Utc>,
    ) -> Result<FileAttachment, SlackError> {
        debug!("Fetching history of channel {} since {}", channel, oldest);
        let oldest_ts = oldest.timestamp().to_string();
        let resp: HistoryResponse = self
            .client
            .get(format!("{}/conversations.history", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("channel", channel), ("oldest", oldest_ts.as_str())])
            .send()
            .await
            .map_err(|e| SlackError::Connection(e.to_string()))?
            .json()
            .await
            .map_err(|e| SlackError::Parse(e.to_string()))?;

        if !resp.ok {
            return Err(SlackError::Api(
                resp.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        if resp.messages.is_empty() {
            return Err(SlackError::NoMessages(channel.to_string()));
        }

        newest_file_attachment(&resp.messages)
            .ok_or_else(|| SlackError::NoAttachment(channel.to_string()))
    }

    /// Download a private file attachment.
    pub async fn download_file(&self, url: &str) -> Result<Vec<u8>, SlackError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SlackError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SlackError::Api(format!(
                "file download failed: HTTP {}",
                resp.status()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SlackError::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Pick the first file of the newest message carrying files.
///
/// Slack timestamps are decimal strings ("1724832000.000200"); string
/// comparison is not reliable across second-boundary lengths, so compare the
/// parsed value.
fn newest_file_attachment(messages: &[HistoryMessage]) -> Option<FileAttachment> {
    let newest = messages
        .iter()
        .filter(|m| !m.files.is_empty())
        .max_by(|a, b| {
            let ta = a.ts.parse::<f64>().unwrap_or(0.0);
            let tb = b.ts.parse::<f64>().unwrap_or(0.0);
            ta.total_cmp(&tb)
        })?;

    let file = newest.files.first()?;
    let url = file.url_private_download.clone()?;
    let extension = file
        .name
        .as_deref()
        .and_then(|n| n.rsplit('.').next())
        .or_else(|| url.rsplit('.').next())
        .unwrap_or("jpg")
        .to_ascii_lowercase();

    Some(FileAttachment {
        download_url: url,
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(ts: &str, files: Vec<HistoryFile>) -> HistoryMessage {
        HistoryMessage {
            ts: ts.to_string(),
            files,
        }
    }

    fn file(name: Option<&str>, url: Option<&str>) -> HistoryFile {
        HistoryFile {
            name: name.map(|s| s.to_string()),
            url_private_download: url.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_newest_file_message_wins() {
        let messages = vec![
            msg("1724832000.000200", vec![file(Some("old.png"), Some("https://f/old.png"))]),
            msg("1724835600.000100", vec![]),
            msg("1724833000.000300", vec![file(Some("menu.jpg"), Some("https://f/menu.jpg"))]),
        ];
        let attachment = newest_file_attachment(&messages).unwrap();
        assert_eq!(attachment.download_url, "https://f/menu.jpg");
        assert_eq!(attachment.extension, "jpg");
    }

    #[test]
    fn test_extension_falls_back_to_url() {
        let messages = vec![msg(
            "1724832000.000200",
            vec![file(None, Some("https://files.slack.com/x/photo.PNG"))],
        )];
        let attachment = newest_file_attachment(&messages).unwrap();
        assert_eq!(attachment.extension, "png");
    }

    #[test]
    fn test_no_file_messages() {
        let messages = vec![msg("1724832000.000200", vec![])];
        assert!(newest_file_attachment(&messages).is_none());
    }

    #[test]
    fn test_history_response_parses() {
        let json = r#"{
            "ok": true,
            "messages": [
                {"ts": "1724832000.000200", "text": "menu today",
                 "files": [{"id": "F1", "name": "menu.jpeg",
                            "url_private_download": "https://files.slack.com/menu.jpeg"}]},
                {"ts": "1724831000.000100", "text": "no files here"}
            ]
        }"#;
        let resp: HistoryResponse = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.messages.len(), 2);
        assert!(resp.messages[1].files.is_empty());
    }
}
