//! Slack Web API sender.
//!
//! Posts plain-text messages via `chat.postMessage` with a bot token.
//! This core only sends; it never receives Slack callbacks, so no
//! signature verification lives here.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use maru_core::Channel;

use super::{ChannelSender, SendError};
use crate::config::SlackConfig;

/// Slack Web API base URL.
const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
}

/// Slack sender for order notifications.
#[derive(Clone)]
pub struct SlackSender {
    client: Client,
    bot_token: SecretString,
    default_channel: String,
}

impl std::fmt::Debug for SlackSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackSender")
            .field("bot_token", &"[REDACTED]")
            .field("default_channel", &self.default_channel)
            .finish_non_exhaustive()
    }
}

impl SlackSender {
    /// Create a sender from configuration.
    #[must_use]
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.bot_token.clone(),
            default_channel: config.channel_id.clone(),
        }
    }
}

#[async_trait]
impl ChannelSender for SlackSender {
    fn channel(&self) -> Channel {
        Channel::Slack
    }

    #[instrument(skip(self, subject, body))]
    async fn send(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), SendError> {
        let channel = recipient.unwrap_or(&self.default_channel);
        // Slack has no subject line; fold it in as a bold lead-in.
        let text = subject.map_or_else(
            || body.to_string(),
            |subject| format!("*{subject}*\n{body}"),
        );

        let message = PostMessage {
            channel,
            text: &text,
        };

        let response = self
            .client
            .post(format!("{SLACK_API_BASE}/chat.postMessage"))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&message)
            .send()
            .await
            .map_err(|e| SendError::Request(e.to_string()))?;

        let result: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| SendError::Response(e.to_string()))?;

        if !result.ok {
            error!(error = ?result.error, "Slack API error posting message");
            return Err(SendError::Api(
                result.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        debug!(ts = ?result.ts, "message posted to Slack");

        Ok(())
    }
}
