//! Upload stage: post the daily summary to a Slack channel.

use anyhow::Context;
use tracing::{error, info};

use crate::config::SiteConfig;
use crate::models::{SlackUploadTaskInput, SlackUploadTaskOutput};
use crate::slack::{SlackClient, SLACK_BOT_TOKEN_VAR};

use super::require_env;

/// Post the summary file's text to the configured channel.
///
/// A delivery failure is reported in the output's `error` field rather than
/// raised; the caller decides whether that is fatal.
pub async fn slack_upload_task(
    input: &SlackUploadTaskInput,
) -> anyhow::Result<SlackUploadTaskOutput> {
    // Config is not otherwise used here, but an invalid one is still a
    // precondition failure: the stage refuses to publish from a broken setup.
    SiteConfig::load(&input.site_config_file)?;

    let summary_text = std::fs::read_to_string(&input.summary_file).with_context(|| {
        format!("cannot read summary file {}", input.summary_file.display())
    })?;

    let token = require_env(SLACK_BOT_TOKEN_VAR)?;
    let client = SlackClient::new(token)?;

    match client.post_message(&input.channel_id, &summary_text).await {
        Ok(()) => {
            info!("Posted summary to Slack channel {}", input.channel_id);
            Ok(SlackUploadTaskOutput { error: None })
        }
        Err(e) => {
            let message = format!("Error posting message to Slack: {e}");
            error!("{}", message);
            Ok(SlackUploadTaskOutput {
                error: Some(message),
            })
        }
    }
}
