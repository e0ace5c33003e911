//! Notification message templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transport family a template is written for.
///
/// Only push-style channels carry templates; email reuses the FCM copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateChannel {
    Fcm,
    Slack,
}

impl std::fmt::Display for TemplateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fcm => write!(f, "fcm"),
            Self::Slack => write!(f, "slack"),
        }
    }
}

/// Publication state of a template.
///
/// Only `published` templates are eligible for live rendering; `draft`
/// is editable and previewable but never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Draft,
    Published,
}

/// A notification message template.
///
/// `body` (and `subject`, FCM only) may contain `{{variable}}`
/// placeholders. Templates are versioned informally through
/// `updated_at`/`published_at`; no history of prior bodies is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTemplate {
    /// Unique key, conventionally `{event}_{locale}`.
    pub name: String,
    pub channel: TemplateChannel,
    /// BCP 47 locale tag.
    pub locale: String,
    /// FCM title; absent for Slack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    pub status: TemplateStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NotificationTemplate {
    /// Whether this template may be used for live dispatch.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == TemplateStatus::Published
    }
}

/// A rendered message, ready for a channel sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: Option<String>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_published_is_dispatchable() {
        let mut template = NotificationTemplate {
            name: "order.created_ko-KR".to_string(),
            channel: TemplateChannel::Fcm,
            locale: "ko-KR".to_string(),
            subject: Some("{{store_name}}".to_string()),
            body: "{{order_number}}".to_string(),
            status: TemplateStatus::Draft,
            updated_at: Utc::now(),
            published_at: None,
        };
        assert!(!template.is_published());

        template.status = TemplateStatus::Published;
        assert!(template.is_published());
    }
}
