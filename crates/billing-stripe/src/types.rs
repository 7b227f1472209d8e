//! Stripe wire types and their mapping onto `billing_core` resources.

use billing_core::{
    CheckoutSession, Customer, PaymentLink, PortalSession, Price, Subscription, SubscriptionItem,
};
use chrono::DateTime;
use serde::Deserialize;

/// A field Stripe returns either as an ID or as the expanded object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub(crate) fn into_id(self) -> String {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripePrice {
    pub id: String,
    #[serde(default)]
    pub lookup_key: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl From<StripePrice> for Price {
    fn from(p: StripePrice) -> Self {
        Price {
            id: p.id,
            lookup_key: p.lookup_key,
            active: p.active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub customer: Option<Expandable>,
}

impl From<StripeCheckoutSession> for CheckoutSession {
    fn from(s: StripeCheckoutSession) -> Self {
        CheckoutSession {
            id: s.id,
            url: s.url,
            customer_id: s.customer.map(Expandable::into_id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripePortalSession {
    pub id: String,
    pub url: String,
}

impl From<StripePortalSession> for PortalSession {
    fn from(s: StripePortalSession) -> Self {
        PortalSession { id: s.id, url: s.url }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripePaymentLink {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

impl From<StripePaymentLink> for PaymentLink {
    fn from(l: StripePaymentLink) -> Self {
        PaymentLink {
            id: l.id,
            url: l.url,
            active: l.active,
        }
    }
}

/// Deleted customers come back as `{ id, object, deleted: true }`
#[derive(Debug, Deserialize)]
pub(crate) struct StripeCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<StripeCustomer> for Customer {
    fn from(c: StripeCustomer) -> Self {
        Customer {
            id: c.id,
            email: c.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripePriceRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePriceRef,
    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeSubscription {
    pub id: String,
    pub customer: Expandable,
    pub status: String,
    pub items: StripeList<StripeSubscriptionItem>,
    #[serde(default)]
    pub trial_end: Option<i64>,
}

impl From<StripeSubscription> for Subscription {
    fn from(s: StripeSubscription) -> Self {
        Subscription {
            id: s.id,
            customer_id: s.customer.into_id(),
            status: s.status,
            items: s
                .items
                .data
                .into_iter()
                .map(|item| SubscriptionItem {
                    id: item.id,
                    price_id: item.price.id,
                    quantity: item.quantity,
                })
                .collect(),
            trial_end: s.trial_end.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeEventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StripeEventData {
    pub object: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expandable_customer() {
        let session: StripeCheckoutSession = serde_json::from_value(json!({
            "id": "cs_test_1",
            "url": null,
            "customer": { "id": "cus_expanded", "object": "customer" }
        }))
        .unwrap();
        let session = CheckoutSession::from(session);

        assert_eq!(session.customer_id.as_deref(), Some("cus_expanded"));
        assert_eq!(session.url, None);
    }

    #[test]
    fn test_subscription_mapping() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "object": "subscription",
            "customer": "cus_1",
            "status": "trialing",
            "trial_end": 1_700_000_000,
            "items": {
                "object": "list",
                "data": [
                    { "id": "si_1", "price": { "id": "price_1", "object": "price" }, "quantity": 1 }
                ],
                "has_more": false
            }
        }))
        .unwrap();
        let sub = Subscription::from(sub);

        assert_eq!(sub.customer_id, "cus_1");
        assert_eq!(sub.first_price_id(), Some("price_1"));
        assert_eq!(sub.trial_end.unwrap().timestamp(), 1_700_000_000);
    }
}
