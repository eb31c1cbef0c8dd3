//! Site records and per-restaurant stage outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// URL scheme prefix marking a Slack-channel-sourced restaurant.
pub const SLACK_URL_PREFIX: &str = "slack://";

/// One restaurant from the site configuration. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Unique key; also the basename of every per-restaurant artifact.
    pub id: String,
    pub name: String,
    /// Either a web page (`http(s)://...`) or a Slack channel (`slack://C...`).
    pub url: String,
}

impl Restaurant {
    /// Whether this restaurant's menu is captured by rendering a web page.
    pub fn is_web(&self) -> bool {
        self.url.starts_with("http")
    }

    /// Whether this restaurant's menu is downloaded from a Slack channel.
    pub fn is_slack(&self) -> bool {
        self.url.starts_with(SLACK_URL_PREFIX)
    }

    /// Channel id for slack-sourced restaurants.
    pub fn slack_channel(&self) -> Option<&str> {
        self.url.strip_prefix(SLACK_URL_PREFIX)
    }
}

/// A per-restaurant failure record; `id` correlates to a `Restaurant.id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub id: String,
    pub error: String,
}

impl ErrorResult {
    pub fn new(id: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            id: id.into(),
            error: error.to_string(),
        }
    }
}

/// A successful image capture or download for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotResult {
    pub id: String,
    pub path: PathBuf,
}

/// A successful menu extraction for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub id: String,
    pub data: super::ParsedMenu,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(url: &str) -> Restaurant {
        Restaurant {
            id: "u-kotvy".to_string(),
            name: "U Kotvy".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_url_classification() {
        assert!(restaurant("https://ukotvy.cz/menu").is_web());
        assert!(!restaurant("https://ukotvy.cz/menu").is_slack());

        let slack = restaurant("slack://C0123ABCD");
        assert!(slack.is_slack());
        assert!(!slack.is_web());
        assert_eq!(slack.slack_channel(), Some("C0123ABCD"));
    }
}
