//! Email sender.
//!
//! Uses SMTP via lettre for delivery. Bodies arrive already rendered by
//! the template pipeline, so messages are plain text.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use maru_core::Channel;

use super::{ChannelSender, SendError};
use crate::config::SmtpConfig;

/// Subject used when a message carries none.
const DEFAULT_SUBJECT: &str = "마루 주문 알림";

/// Email sender for order notifications.
#[derive(Clone)]
pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl std::fmt::Debug for EmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSender")
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl EmailSender {
    /// Create an email sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP transport fails to initialize.
    pub fn new(config: &SmtpConfig) -> Result<Self, SendError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| SendError::Smtp(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(skip(self, subject, body))]
    async fn send(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), SendError> {
        let to = recipient.ok_or(SendError::MissingRecipient(Channel::Email))?;

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| SendError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| SendError::InvalidAddress(to.to_string()))?)
            .subject(subject.unwrap_or(DEFAULT_SUBJECT))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| SendError::Smtp(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| SendError::Smtp(e.to_string()))?;

        debug!(to = %to, "notification email sent");

        Ok(())
    }
}
