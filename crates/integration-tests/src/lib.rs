//! Integration test harness for Maru order services.
//!
//! Wires the status service and dispatcher against the in-memory stores
//! with recording channel senders, so scenario tests can drive the full
//! transition-and-dispatch path and inspect what each channel received.
//!
//! # Test Categories
//!
//! - `order_lifecycle` - transition table, idempotency, history integrity
//! - `notification_dispatch` - preference/pause/quiet-hours gates, fan-out
//! - `retry_queue` - bounded retries and queue durability

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use maru_core::{
    Actor, Channel, CurrencyCode, CustomerContact, NotificationPreferences, NotificationTemplate,
    Order, OrderId, OrderItem, OrderStatus, OrderStatusHistoryEntry, PaymentDescriptor, StoreId,
    TemplateChannel, TemplateStatus, UserId,
};
use maru_orders::channel::{ChannelSender, SendError, SenderRegistry};
use maru_orders::config::OrdersConfig;
use maru_orders::services::dispatch::NotificationDispatcher;
use maru_orders::services::status::OrderStatusService;
use maru_orders::store::{
    InMemoryDispatchLog, InMemoryOperationalSettings, InMemoryOrderStore, InMemoryPreferenceStore,
    InMemoryTemplateStore, OrderStore, TemplateStore,
};

/// Initialize tracing for a test binary. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maru_orders=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// One message captured by a [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: String,
}

/// A channel sender that records messages instead of delivering them,
/// with a switchable failure mode for outage scenarios.
pub struct RecordingSender {
    channel: Channel,
    failing: AtomicBool,
    sent: std::sync::Mutex<Vec<RecordedMessage>>,
}

impl RecordingSender {
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            failing: AtomicBool::new(false),
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages recorded so far.
    pub fn sent(&self) -> Vec<RecordedMessage> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(
        &self,
        recipient: Option<&str>,
        subject: Option<&str>,
        body: &str,
    ) -> Result<(), SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError::Api("simulated outage".to_string()));
        }
        self.sent.lock().expect("sent lock").push(RecordedMessage {
            recipient: recipient.map(str::to_string),
            subject: subject.map(str::to_string),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Fully wired service graph over in-memory stores.
pub struct TestHarness {
    pub orders: Arc<InMemoryOrderStore>,
    pub preferences: Arc<InMemoryPreferenceStore>,
    pub templates: Arc<InMemoryTemplateStore>,
    pub settings: Arc<InMemoryOperationalSettings>,
    pub log: Arc<InMemoryDispatchLog>,
    pub fcm: Arc<RecordingSender>,
    pub slack: Arc<RecordingSender>,
    pub email: Arc<RecordingSender>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub service: OrderStatusService,
}

impl TestHarness {
    #[must_use]
    pub fn new() -> Self {
        init_tracing();

        let orders = Arc::new(InMemoryOrderStore::new());
        let preferences = Arc::new(InMemoryPreferenceStore::new());
        let templates = Arc::new(InMemoryTemplateStore::new());
        let settings = Arc::new(InMemoryOperationalSettings::new());
        let log = Arc::new(InMemoryDispatchLog::new());

        let fcm = Arc::new(RecordingSender::new(Channel::Fcm));
        let slack = Arc::new(RecordingSender::new(Channel::Slack));
        let email = Arc::new(RecordingSender::new(Channel::Email));

        let mut senders: SenderRegistry = HashMap::new();
        senders.insert(Channel::Fcm, fcm.clone() as Arc<dyn ChannelSender>);
        senders.insert(Channel::Slack, slack.clone() as Arc<dyn ChannelSender>);
        senders.insert(Channel::Email, email.clone() as Arc<dyn ChannelSender>);

        let dispatcher = Arc::new(NotificationDispatcher::new(
            templates.clone(),
            settings.clone(),
            log.clone(),
            senders,
            &OrdersConfig::default(),
        ));

        let service = OrderStatusService::new(
            orders.clone(),
            preferences.clone(),
            dispatcher.clone(),
        );

        Self {
            orders,
            preferences,
            templates,
            settings,
            log,
            fcm,
            slack,
            email,
            dispatcher,
            service,
        }
    }

    /// Seed an order in the given status with one matching history entry.
    pub async fn seed_order(&self, id: &str, status: OrderStatus) -> Order {
        let order = sample_order(id, status);
        self.orders.insert(order.clone()).await.expect("seed order");
        order
    }

    /// Publish a template for live dispatch.
    pub async fn publish_template(
        &self,
        name: &str,
        channel: TemplateChannel,
        subject: Option<&str>,
        body: &str,
    ) {
        let now = Utc::now();
        self.templates
            .upsert(NotificationTemplate {
                name: name.to_string(),
                channel,
                locale: "ko-KR".to_string(),
                subject: subject.map(str::to_string),
                body: body.to_string(),
                status: TemplateStatus::Published,
                updated_at: now,
                published_at: Some(now),
            })
            .await
            .expect("publish template");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an order in the given status, owned by `user-1`, with one
/// matching history entry.
#[must_use]
pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::new(id),
        store_id: StoreId::new("store-1"),
        store_name: "마루식당".to_string(),
        order_number: format!("A-{id}"),
        items: vec![OrderItem {
            name: "비빔밥".to_string(),
            quantity: 2,
            unit_price: Decimal::from(9000),
            options: Vec::new(),
        }],
        status,
        contact: CustomerContact::from_unmasked("김민수", "010-1234-5678"),
        delivery_address: None,
        payment: PaymentDescriptor::DISABLED,
        delivery_fee: Decimal::from(3000),
        currency: CurrencyCode::KRW,
        customer_user_id: Some(UserId::new("user-1")),
        history: vec![OrderStatusHistoryEntry::new(
            status,
            None,
            Actor::System,
            Uuid::new_v4(),
        )],
        last_mutation_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Preferences with the given channels enabled and an FCM token on file.
#[must_use]
pub fn prefs_with_channels(enabled: &[Channel]) -> NotificationPreferences {
    let mut prefs = NotificationPreferences::default();
    for channel in Channel::ALL {
        prefs.channels.insert(channel, enabled.contains(&channel));
    }
    prefs.recipients.fcm_token = Some("device-token-1".to_string());
    prefs.recipients.slack_channel = Some("C012345".to_string());
    prefs.recipients.email = Some("minsu@example.com".to_string());
    prefs
}
