//! Slack integration: summary upload and menu-photo download.

mod client;

pub use client::{attachment_lookback, FileAttachment, SlackClient, SlackError};

/// Environment variable holding the Slack bot token.
pub const SLACK_BOT_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
/// Environment variable holding the default channel for summary upload.
pub const SLACK_CHANNEL_ID_VAR: &str = "SLACK_CHANNEL_ID";
