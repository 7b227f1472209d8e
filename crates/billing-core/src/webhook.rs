//! # Webhook Events
//!
//! Provider-agnostic view of a verified webhook event and the handler
//! trait it is dispatched to.
//!
//! Only subscription lifecycle events are decoded. Anything else is
//! acknowledged and logged. There is no deduplication: a redelivered
//! event is handled again.

use crate::error::BillingResult;
use crate::model::Subscription;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Subscription lifecycle events this server reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEventKind {
    Created,
    Updated,
    Deleted,
    TrialWillEnd,
}

impl SubscriptionEventKind {
    /// Map a provider event type string to a lifecycle kind
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "customer.subscription.created" => Some(Self::Created),
            "customer.subscription.updated" => Some(Self::Updated),
            "customer.subscription.deleted" => Some(Self::Deleted),
            "customer.subscription.trial_will_end" => Some(Self::TrialWillEnd),
            _ => None,
        }
    }

    pub fn as_event_type(&self) -> &'static str {
        match self {
            Self::Created => "customer.subscription.created",
            Self::Updated => "customer.subscription.updated",
            Self::Deleted => "customer.subscription.deleted",
            Self::TrialWillEnd => "customer.subscription.trial_will_end",
        }
    }
}

/// Events that should be enabled on the webhook endpoint
pub const SUBSCRIPTION_EVENTS: &[&str] = &[
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
    "customer.subscription.trial_will_end",
];

/// Decoded body of an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Subscription {
        kind: SubscriptionEventKind,
        subscription: Subscription,
    },
    /// An event type we do not act on
    Unhandled,
}

/// A verified webhook event
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    /// Event ID (evt_...)
    pub id: String,
    /// Raw event type string
    pub event_type: String,
    pub created: DateTime<Utc>,
    pub livemode: bool,
    pub payload: EventPayload,
}

/// Webhook event handler trait
///
/// Implement this trait to react to subscription lifecycle events.
/// The defaults only log.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn on_subscription_created(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription created for {}.", subscription.id);
        Ok(())
    }

    async fn on_subscription_updated(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription updated for {}.", subscription.id);
        Ok(())
    }

    async fn on_subscription_deleted(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription deleted for {}.", subscription.id);
        Ok(())
    }

    async fn on_trial_will_end(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription trial will end for {}.", subscription.id);
        Ok(())
    }

    async fn on_unhandled_event(&self, event: &WebhookEvent) -> BillingResult<()> {
        warn!(event_id = %event.id, "Unhandled event type: {}", event.event_type);
        Ok(())
    }
}

/// Dispatch a webhook event to the appropriate handler method
pub async fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: &WebhookEvent,
) -> BillingResult<()> {
    match &event.payload {
        EventPayload::Subscription { kind, subscription } => match kind {
            SubscriptionEventKind::Created => handler.on_subscription_created(subscription).await,
            SubscriptionEventKind::Updated => handler.on_subscription_updated(subscription).await,
            SubscriptionEventKind::Deleted => handler.on_subscription_deleted(subscription).await,
            SubscriptionEventKind::TrialWillEnd => handler.on_trial_will_end(subscription).await,
        },
        EventPayload::Unhandled => handler.on_unhandled_event(event).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebhookHandler for RecordingHandler {
        async fn on_trial_will_end(&self, subscription: &Subscription) -> BillingResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("trial_will_end:{}", subscription.id));
            Ok(())
        }

        async fn on_unhandled_event(&self, event: &WebhookEvent) -> BillingResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("unhandled:{}", event.event_type));
            Ok(())
        }
    }

    fn subscription() -> Subscription {
        Subscription {
            id: "sub_123".into(),
            customer_id: "cus_123".into(),
            status: "trialing".into(),
            items: vec![],
            trial_end: None,
        }
    }

    fn event(event_type: &str, payload: EventPayload) -> WebhookEvent {
        WebhookEvent {
            id: "evt_1".into(),
            event_type: event_type.into(),
            created: Utc::now(),
            livemode: false,
            payload,
        }
    }

    #[test]
    fn test_event_kind_mapping() {
        for name in SUBSCRIPTION_EVENTS {
            let kind = SubscriptionEventKind::from_event_type(name).unwrap();
            assert_eq!(kind.as_event_type(), *name);
        }
        assert_eq!(
            SubscriptionEventKind::from_event_type("invoice.paid"),
            None
        );
    }

    #[tokio::test]
    async fn test_dispatch_trial_will_end() {
        let handler = RecordingHandler::default();
        let event = event(
            "customer.subscription.trial_will_end",
            EventPayload::Subscription {
                kind: SubscriptionEventKind::TrialWillEnd,
                subscription: subscription(),
            },
        );

        dispatch_webhook_event(&handler, &event).await.unwrap();

        assert_eq!(*handler.calls.lock().unwrap(), vec!["trial_will_end:sub_123"]);
    }

    #[tokio::test]
    async fn test_dispatch_defaults_and_unhandled() {
        let handler = RecordingHandler::default();

        let created = event(
            "customer.subscription.created",
            EventPayload::Subscription {
                kind: SubscriptionEventKind::Created,
                subscription: subscription(),
            },
        );
        dispatch_webhook_event(&handler, &created).await.unwrap();

        let other = event("invoice.paid", EventPayload::Unhandled);
        dispatch_webhook_event(&handler, &other).await.unwrap();

        assert_eq!(*handler.calls.lock().unwrap(), vec!["unhandled:invoice.paid"]);
    }
}
