//! Per-dispatch outcome reporting.

use serde::{Deserialize, Serialize};

use super::preferences::Channel;

/// Outcome of one notification dispatch attempt.
///
/// Not persisted; returned to the caller so the UI can surface delivery
/// warnings. Every channel the preference resolver deemed eligible
/// appears in exactly one of `sent`, `queued`, or `skipped`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Whether the underlying status transition succeeded. Channel-level
    /// failures never flip this; they are carried in `warnings`.
    pub success: bool,
    /// Channels the message was delivered to.
    pub sent: Vec<Channel>,
    /// Channels deferred for quiet hours, awaiting external redelivery.
    pub queued: Vec<Channel>,
    /// Channels skipped (opted out, unconfigured, or failed).
    pub skipped: Vec<Channel>,
    /// Human-readable delivery warnings.
    pub warnings: Vec<String>,
}

impl DispatchResult {
    /// A successful result with every eligible channel skipped.
    #[must_use]
    pub fn skipped_all(channels: Vec<Channel>, warning: impl Into<String>) -> Self {
        Self {
            success: true,
            sent: Vec::new(),
            queued: Vec::new(),
            skipped: channels,
            warnings: vec![warning.into()],
        }
    }

    /// Whether delivery was degraded (any warning recorded).
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check the aggregation invariant: `sent ∪ queued ∪ skipped` equals
    /// `eligible` with no channel in more than one list.
    #[must_use]
    pub fn is_partition_of(&self, eligible: &[Channel]) -> bool {
        let mut all: Vec<Channel> = self
            .sent
            .iter()
            .chain(&self.queued)
            .chain(&self.skipped)
            .copied()
            .collect();
        if all.len() != eligible.len() {
            return false;
        }
        all.sort_by_key(|c| c.key());
        let mut expected = eligible.to_vec();
        expected.sort_by_key(|c| c.key());
        all.dedup();
        all == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_all() {
        let result = DispatchResult::skipped_all(vec![Channel::Fcm, Channel::Slack], "paused");
        assert!(result.success);
        assert!(result.sent.is_empty());
        assert_eq!(result.skipped, vec![Channel::Fcm, Channel::Slack]);
        assert!(result.is_degraded());
    }

    #[test]
    fn test_partition_invariant() {
        let result = DispatchResult {
            success: true,
            sent: vec![Channel::Fcm],
            queued: vec![],
            skipped: vec![Channel::Email],
            warnings: vec![],
        };
        assert!(result.is_partition_of(&[Channel::Fcm, Channel::Email]));
        assert!(!result.is_partition_of(&[Channel::Fcm]));
        assert!(!result.is_partition_of(&[Channel::Fcm, Channel::Slack]));
    }

    #[test]
    fn test_partition_rejects_overlap() {
        let result = DispatchResult {
            success: true,
            sent: vec![Channel::Fcm],
            queued: vec![],
            skipped: vec![Channel::Fcm],
            warnings: vec![],
        };
        assert!(!result.is_partition_of(&[Channel::Fcm, Channel::Fcm]));
        assert!(!result.is_partition_of(&[Channel::Fcm]));
    }
}
