//! FCM push sender.
//!
//! Posts to the FCM legacy HTTP send endpoint with a server key. The
//! recipient is a device token or a `/topics/...` topic.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use maru_core::Channel;

use super::{ChannelSender, SendError};
use crate::config::FcmConfig;

#[derive(Serialize)]
struct FcmMessage<'a> {
    to: &'a str,
    notification: FcmNotification<'a>,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    body: &'a str,
}

#[derive(Deserialize)]
struct FcmResponse {
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Deserialize)]
struct FcmResult {
    error: Option<String>,
}

/// FCM sender for order notifications.
#[derive(Clone)]
pub struct FcmSender {
    client: Client,
    server_key: SecretString,
    endpoint: String,
}

impl std::fmt::Debug for FcmSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmSender")
            .field("server_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl FcmSender {
    /// Create a sender from configuration.
    #[must_use]
    pub fn new(config: &FcmConfig) -> Self {
        Self {
            client: Client::new(),
            server_key: config.server_key.clone(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ChannelSender for FcmSender {
    fn channel(&self) -> Channel {
        Channel::Fcm
    }

    #[instrument(skip(self, subject, body))]
    async fn send(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), SendError> {
        let to = recipient.ok_or(SendError::MissingRecipient(Channel::Fcm))?;

        let message = FcmMessage {
            to,
            notification: FcmNotification {
                title: subject,
                body,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("key={}", self.server_key.expose_secret()),
            )
            .json(&message)
            .send()
            .await
            .map_err(|e| SendError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SendError::Api(format!("fcm returned {status}")));
        }

        let result: FcmResponse = response
            .json()
            .await
            .map_err(|e| SendError::Response(e.to_string()))?;

        if result.failure > 0 {
            let detail = result
                .results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            error!(failure = result.failure, error = %detail, "FCM send failed");
            return Err(SendError::Api(detail));
        }

        debug!("message sent to FCM");

        Ok(())
    }
}
