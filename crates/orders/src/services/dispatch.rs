//! Notification dispatch pipeline.
//!
//! One entry point, [`NotificationDispatcher::dispatch`], orchestrates a
//! single status-change event: preference gate, global pause gate,
//! quiet-hours gate, template rendering, and per-channel fan-out with
//! independent outcomes. The pipeline never fails the caller - every
//! notification-path error is converted into a warning on the result.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use maru_core::{
    Channel, DispatchResult, NotificationEvent, NotificationPreferences, Order,
    OrderStatusHistoryEntry, RenderedMessage, TemplateChannel,
};

use crate::channel::{SendError, SenderRegistry};
use crate::config::{OrdersConfig, QuietHoursPolicy};
use crate::notify::log::DispatchLogEntry;
use crate::notify::{quiet, resolver, template};
use crate::store::{DispatchLogStore, OperationalSettings, TemplateStore};

/// Orchestrates notification delivery for order status changes.
pub struct NotificationDispatcher {
    templates: Arc<dyn TemplateStore>,
    settings: Arc<dyn OperationalSettings>,
    log: Arc<dyn DispatchLogStore>,
    senders: SenderRegistry,
    quiet_hours_policy: QuietHoursPolicy,
    default_locale: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        settings: Arc<dyn OperationalSettings>,
        log: Arc<dyn DispatchLogStore>,
        senders: SenderRegistry,
        config: &OrdersConfig,
    ) -> Self {
        Self {
            templates,
            settings,
            log,
            senders,
            quiet_hours_policy: config.quiet_hours_policy,
            default_locale: config.default_locale.clone(),
        }
    }

    /// Dispatch notifications for one accepted status transition.
    ///
    /// Infallible by design: the underlying transition has already
    /// succeeded, and channel-level problems surface only as warnings.
    pub async fn dispatch(
        &self,
        order: &Order,
        entry: &OrderStatusHistoryEntry,
        prefs: Option<&NotificationPreferences>,
    ) -> DispatchResult {
        self.dispatch_at(order, entry, prefs, Utc::now()).await
    }

    /// [`Self::dispatch`] with an explicit clock, for deterministic tests.
    #[instrument(skip_all, fields(order_id = %order.id, status = %entry.status))]
    pub async fn dispatch_at(
        &self,
        order: &Order,
        entry: &OrderStatusHistoryEntry,
        prefs: Option<&NotificationPreferences>,
        now: DateTime<Utc>,
    ) -> DispatchResult {
        let event = NotificationEvent::from_status(entry.status);
        let eligible = resolver::eligible_channels(prefs);
        let mut warnings: Vec<String> = Vec::new();

        // 1. User opt-out gate - no template work past this point.
        if !resolver::should_notify(event, prefs) {
            let warning = if eligible.is_empty() {
                format!("user has no notification channels enabled, skipping {event}")
            } else {
                format!("user opted out of {event}, skipping notification")
            };
            info!(event = %event, "notification skipped by preferences");
            return DispatchResult::skipped_all(eligible, warning);
        }

        // 2. Global pause gate.
        match self.settings.notifications_paused().await {
            Ok(true) => {
                info!(event = %event, "notifications globally paused, skipping");
                warnings.push("notifications are globally paused".to_string());
                return DispatchResult {
                    success: true,
                    sent: Vec::new(),
                    queued: Vec::new(),
                    skipped: eligible,
                    warnings,
                };
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "could not read global pause flag, proceeding");
                warnings.push(format!("could not read global pause flag: {e}"));
            }
        }

        // 3. Quiet-hours gate - defer without rendering.
        if let Some(prefs) = prefs
            && quiet::is_quiet_at(prefs, now)
        {
            let scheduled_for = quiet::next_delivery_after(prefs, now);
            let queued = match self.quiet_hours_policy {
                QuietHoursPolicy::DeferAll => eligible,
            };
            for &channel in &queued {
                self.append_log(DispatchLogEntry::queued(
                    order,
                    channel,
                    event,
                    scheduled_for,
                    now,
                ))
                .await;
            }
            warnings.push(format!(
                "quiet hours active, delivery deferred until {}",
                scheduled_for.to_rfc3339()
            ));
            info!(scheduled_for = %scheduled_for, "notification deferred for quiet hours");
            return DispatchResult {
                success: true,
                sent: Vec::new(),
                queued,
                skipped: Vec::new(),
                warnings,
            };
        }

        // 4-5. Resolve and render the template once per template family,
        // falling back to default copy instead of aborting.
        let locale = prefs
            .and_then(|p| p.locale.as_deref())
            .unwrap_or(&self.default_locale);
        let template_name = format!("{}_{locale}", event.key());
        let data = build_template_data(order, entry);

        let mut rendered: HashMap<TemplateChannel, RenderedMessage> = HashMap::new();
        for template_channel in eligible.iter().map(|c| c.template_channel()) {
            if rendered.contains_key(&template_channel) {
                continue;
            }
            let message = self
                .resolve_message(template_channel, &template_name, &data, order, entry, &mut warnings)
                .await;
            rendered.insert(template_channel, message);
        }

        // 6. Fan out. Sends are independent: they suspend concurrently and
        // one channel's failure never affects another.
        let sends = eligible.iter().map(|&channel| {
            let message = rendered
                .get(&channel.template_channel())
                .cloned()
                .unwrap_or_else(|| {
                    template::fallback_message(
                        channel.template_channel(),
                        &order.store_name,
                        &order.order_number,
                        entry.status,
                    )
                });
            let recipient = resolve_recipient(channel, order, prefs);
            async move {
                let outcome = self
                    .send_one(channel, recipient.as_deref(), &message)
                    .await;
                (channel, outcome)
            }
        });
        let outcomes = join_all(sends).await;

        let mut sent = Vec::new();
        let mut skipped = Vec::new();
        for (channel, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    info!(channel = %channel, "notification sent");
                    sent.push(channel);
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "notification send failed");
                    warnings.push(format!("{channel} delivery failed: {e}"));
                    self.append_log(DispatchLogEntry::failed(
                        order,
                        channel,
                        event,
                        e.code(),
                        e.to_string(),
                        now,
                    ))
                    .await;
                    skipped.push(channel);
                }
            }
        }

        DispatchResult {
            success: true,
            sent,
            queued: Vec::new(),
            skipped,
            warnings,
        }
    }

    /// Look up, validate, and render the template for one family,
    /// degrading to default copy with a warning on any problem.
    async fn resolve_message(
        &self,
        template_channel: TemplateChannel,
        name: &str,
        data: &Map<String, Value>,
        order: &Order,
        entry: &OrderStatusHistoryEntry,
        warnings: &mut Vec<String>,
    ) -> RenderedMessage {
        let fallback = || {
            template::fallback_message(
                template_channel,
                &order.store_name,
                &order.order_number,
                entry.status,
            )
        };

        match self.templates.find(name, template_channel).await {
            Ok(Some(found)) if found.is_published() => {
                let report = template::validate(&found);
                if !report.valid {
                    warnings.push(format!(
                        "template {name} invalid ({}), using default copy",
                        report.errors.join("; ")
                    ));
                    return fallback();
                }
                let message = template::render(&found, data);
                let constraints = template::check_constraints(
                    template_channel,
                    message.subject.as_deref(),
                    &message.body,
                );
                warnings.extend(constraints.warnings.iter().map(|w| format!("{name}: {w}")));
                if constraints.valid {
                    message
                } else {
                    fallback()
                }
            }
            Ok(Some(_)) => {
                warnings.push(format!("template {name} is not published, using default copy"));
                fallback()
            }
            Ok(None) => {
                warnings.push(format!("template {name} not found, using default copy"));
                fallback()
            }
            Err(e) => {
                warn!(error = %e, template = %name, "template lookup failed");
                warnings.push(format!("template lookup failed ({e}), using default copy"));
                fallback()
            }
        }
    }

    async fn send_one(
        &self,
        channel: Channel,
        recipient: Option<&str>,
        message: &RenderedMessage,
    ) -> Result<(), SendError> {
        let Some(sender) = self.senders.get(&channel) else {
            return Err(SendError::NotConfigured(channel));
        };
        sender
            .send(recipient, message.subject.as_deref(), &message.body)
            .await
    }

    async fn append_log(&self, entry: DispatchLogEntry) {
        if let Err(e) = self.log.append(entry).await {
            warn!(error = %e, "failed to record dispatch log entry");
        }
    }
}

/// Recipient address for a channel: the user's address on file, or the
/// store-wide FCM topic for preference-less (guest) dispatch.
fn resolve_recipient(
    channel: Channel,
    order: &Order,
    prefs: Option<&NotificationPreferences>,
) -> Option<String> {
    if let Some(prefs) = prefs
        && let Some(address) = prefs.recipients.for_channel(channel)
    {
        return Some(address.to_string());
    }
    match channel {
        Channel::Fcm => Some(format!("/topics/store-{}", order.store_id)),
        Channel::Slack | Channel::Email => None,
    }
}

/// Substitution data built from the order snapshot and history entry.
fn build_template_data(order: &Order, entry: &OrderStatusHistoryEntry) -> Map<String, Value> {
    let totals = order.totals();
    let mut data = Map::new();
    data.insert("store_name".to_string(), json!(order.store_name));
    data.insert("order_number".to_string(), json!(order.order_number));
    data.insert("status".to_string(), json!(entry.status.to_string()));
    data.insert(
        "customer_name".to_string(),
        json!(order.contact.masked_name),
    );
    data.insert("total".to_string(), json!(totals.total.amount.to_string()));
    data.insert("item_count".to_string(), json!(order.item_count()));
    data.insert(
        "created_at".to_string(),
        json!(order.created_at.to_rfc3339()),
    );
    data.insert(
        "updated_at".to_string(),
        json!(entry.created_at.to_rfc3339()),
    );
    data.insert(
        "note".to_string(),
        json!(entry.note.clone().unwrap_or_default()),
    );
    data
}
