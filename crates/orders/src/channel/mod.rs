//! Notification channel senders.
//!
//! The dispatcher depends only on the narrow [`ChannelSender`] contract:
//! `send(recipient, subject, body)`. One implementation per transport;
//! timeouts and wire details live behind it.

pub mod email;
pub mod fcm;
pub mod slack;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use maru_core::Channel;

use crate::config::OrdersConfig;

pub use email::EmailSender;
pub use fcm::FcmSender;
pub use slack::SlackSender;

/// Errors that can occur when sending through a channel.
#[derive(Debug, Error)]
pub enum SendError {
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// Failed to parse the transport's response.
    #[error("response error: {0}")]
    Response(String),

    /// Transport API returned an error.
    #[error("api error: {0}")]
    Api(String),

    /// SMTP delivery failed.
    #[error("smtp error: {0}")]
    Smtp(String),

    /// Recipient address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The channel requires a recipient and none was available.
    #[error("missing recipient for {0}")]
    MissingRecipient(Channel),

    /// No sender is configured for the channel.
    #[error("channel {0} is not configured")]
    NotConfigured(Channel),
}

impl SendError {
    /// Stable error code for the dispatch log.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Api(_) => "api",
            Self::Smtp(_) => "smtp",
            Self::InvalidAddress(_) => "invalid_address",
            Self::MissingRecipient(_) => "missing_recipient",
            Self::NotConfigured(_) => "not_configured",
        }
    }
}

/// A notification transport.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Which channel this sender serves.
    fn channel(&self) -> Channel;

    /// Deliver one message.
    ///
    /// `recipient` is channel-specific (FCM token or topic, Slack channel
    /// ID, email address). Senders with a configured default destination
    /// accept `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] on any delivery failure; the dispatcher
    /// converts it into a warning and a skipped channel.
    async fn send(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), SendError>;
}

/// Sender registry keyed by channel.
pub type SenderRegistry = HashMap<Channel, Arc<dyn ChannelSender>>;

/// Build senders for every channel configured in `config`.
///
/// # Errors
///
/// Returns an error if the SMTP transport fails to initialize.
pub fn build_senders(config: &OrdersConfig) -> Result<SenderRegistry, SendError> {
    let mut senders: SenderRegistry = HashMap::new();

    if let Some(fcm) = &config.fcm {
        senders.insert(Channel::Fcm, Arc::new(FcmSender::new(fcm)));
    }
    if let Some(slack) = &config.slack {
        senders.insert(Channel::Slack, Arc::new(SlackSender::new(slack)));
    }
    if let Some(smtp) = &config.smtp {
        senders.insert(Channel::Email, Arc::new(EmailSender::new(smtp)?));
    }

    Ok(senders)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(SendError::Api("x".into()).code(), "api");
        assert_eq!(
            SendError::MissingRecipient(Channel::Email).code(),
            "missing_recipient"
        );
        assert_eq!(
            SendError::NotConfigured(Channel::Slack).code(),
            "not_configured"
        );
    }

    #[test]
    fn test_build_senders_empty_config() {
        let registry = build_senders(&OrdersConfig::default()).expect("build");
        assert!(registry.is_empty());
    }
}
