//! Preference resolution: should an event notify, and on which channels.

use maru_core::{Channel, NotificationEvent, NotificationPreferences};

/// Decide whether an event should produce a notification at all.
///
/// Absent preferences mean "notify" - the safe default for anonymous and
/// guest orders. An explicit `false` for the event opts out. A user with
/// zero enabled channels is treated the same as an opted-out user; the
/// dispatcher surfaces that case with its own warning rather than
/// dropping it silently.
#[must_use]
pub fn should_notify(event: NotificationEvent, prefs: Option<&NotificationPreferences>) -> bool {
    let Some(prefs) = prefs else {
        return true;
    };
    if prefs.event_opted_out(event) {
        return false;
    }
    !prefs.enabled_channels().is_empty()
}

/// Channels eligible for delivery.
///
/// With no preferences on file, delivery defaults to FCM only.
#[must_use]
pub fn eligible_channels(prefs: Option<&NotificationPreferences>) -> Vec<Channel> {
    prefs.map_or_else(
        || vec![Channel::Fcm],
        NotificationPreferences::enabled_channels,
    )
}
