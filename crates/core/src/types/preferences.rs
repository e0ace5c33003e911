//! Per-user notification preferences.
//!
//! Preferences are owned and mutated by the user; the dispatch pipeline
//! only ever reads them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::event::NotificationEvent;
use super::template::TemplateChannel;

/// Locale used when a user has not chosen one.
pub const DEFAULT_LOCALE: &str = "ko-KR";

/// A notification transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Fcm,
    Slack,
    Email,
}

impl Channel {
    /// All channels, in fan-out order.
    pub const ALL: [Self; 3] = [Self::Fcm, Self::Slack, Self::Email];

    /// Stable string key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Fcm => "fcm",
            Self::Slack => "slack",
            Self::Email => "email",
        }
    }

    /// Which template channel carries this transport's copy.
    ///
    /// Templates exist only for `fcm` and `slack`; email reuses the FCM
    /// copy since it is the one with a subject line.
    #[must_use]
    pub const fn template_channel(self) -> TemplateChannel {
        match self {
            Self::Fcm | Self::Email => TemplateChannel::Fcm,
            Self::Slack => TemplateChannel::Slack,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Per-user quiet window during which notifications are deferred.
///
/// `start`/`end` are wall-clock `HH:mm` strings in the given IANA
/// timezone. A window with `start > end` wraps midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    /// Inclusive window start, `HH:mm`.
    pub start: String,
    /// Exclusive window end, `HH:mm`.
    pub end: String,
    /// IANA timezone name, e.g. `Asia/Seoul`.
    pub timezone: String,
}

/// Transport addresses for each channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecipients {
    /// FCM device token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    /// Slack channel or user ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_channel: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ChannelRecipients {
    /// Address for a given channel, if the user has one on file.
    #[must_use]
    pub fn for_channel(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Fcm => self.fcm_token.as_deref(),
            Channel::Slack => self.slack_channel.as_deref(),
            Channel::Email => self.email.as_deref(),
        }
    }
}

/// One user's notification preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Channel enablement. A channel absent from the map is disabled.
    #[serde(default)]
    pub channels: HashMap<Channel, bool>,
    /// Per-event opt-in. An event absent from the map means "notify";
    /// only an explicit `false` opts out.
    #[serde(default)]
    pub events: HashMap<NotificationEvent, bool>,
    /// Optional quiet window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHours>,
    /// BCP 47 locale tag, e.g. `ko-KR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Transport addresses.
    #[serde(default)]
    pub recipients: ChannelRecipients,
}

impl NotificationPreferences {
    /// Channels the user has explicitly enabled, in fan-out order.
    #[must_use]
    pub fn enabled_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.channels.get(c).copied().unwrap_or(false))
            .collect()
    }

    /// Whether the user has explicitly opted out of an event.
    #[must_use]
    pub fn event_opted_out(&self, event: NotificationEvent) -> bool {
        matches!(self.events.get(&event), Some(false))
    }

    /// The user's locale, falling back to [`DEFAULT_LOCALE`].
    #[must_use]
    pub fn locale_or_default(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs_with_channels(enabled: &[Channel]) -> NotificationPreferences {
        let mut prefs = NotificationPreferences::default();
        for channel in Channel::ALL {
            prefs
                .channels
                .insert(channel, enabled.contains(&channel));
        }
        prefs
    }

    #[test]
    fn test_enabled_channels_filters_disabled() {
        let prefs = prefs_with_channels(&[Channel::Fcm, Channel::Email]);
        assert_eq!(prefs.enabled_channels(), vec![Channel::Fcm, Channel::Email]);
    }

    #[test]
    fn test_absent_channel_is_disabled() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.enabled_channels().is_empty());
    }

    #[test]
    fn test_unset_event_means_notify() {
        let prefs = NotificationPreferences::default();
        assert!(!prefs.event_opted_out(NotificationEvent::OrderCreated));
    }

    #[test]
    fn test_explicit_false_opts_out() {
        let mut prefs = NotificationPreferences::default();
        prefs
            .events
            .insert(NotificationEvent::OrderCancelled, false);
        assert!(prefs.event_opted_out(NotificationEvent::OrderCancelled));
        assert!(!prefs.event_opted_out(NotificationEvent::OrderCreated));
    }

    #[test]
    fn test_locale_default() {
        let mut prefs = NotificationPreferences::default();
        assert_eq!(prefs.locale_or_default(), "ko-KR");
        prefs.locale = Some("en-US".to_string());
        assert_eq!(prefs.locale_or_default(), "en-US");
    }

    #[test]
    fn test_email_reuses_fcm_template_channel() {
        assert_eq!(Channel::Email.template_channel(), TemplateChannel::Fcm);
        assert_eq!(Channel::Slack.template_channel(), TemplateChannel::Slack);
    }

    #[test]
    fn test_preferences_serde_round_trip() {
        let mut prefs = prefs_with_channels(&[Channel::Slack]);
        prefs.quiet_hours = Some(QuietHours {
            enabled: true,
            start: "22:00".to_string(),
            end: "08:00".to_string(),
            timezone: "Asia/Seoul".to_string(),
        });
        prefs.recipients.slack_channel = Some("C012345".to_string());

        let json = serde_json::to_string(&prefs).expect("serialize");
        let back: NotificationPreferences = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.enabled_channels(), vec![Channel::Slack]);
        assert_eq!(back.quiet_hours, prefs.quiet_hours);
    }
}
