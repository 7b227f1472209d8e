//! # Billing Resources
//!
//! Provider-side resources this server touches. None of them are stored;
//! each lives for the duration of one request.

use crate::error::{BillingError, BillingResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A price, resolved from its lookup key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Provider price ID (price_...)
    pub id: String,

    /// Stable alias used instead of the ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_key: Option<String>,

    /// Whether new purchases can use this price
    pub active: bool,
}

/// Parameters for a hosted subscription checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCheckout {
    pub price_id: String,
    pub quantity: u32,
    pub trial_period_days: Option<u32>,
    pub allow_promotion_codes: bool,
    pub success_url: String,
    pub cancel_url: String,
}

impl SubscriptionCheckout {
    /// Trial length granted to every new subscription
    pub const TRIAL_PERIOD_DAYS: u32 = 30;

    /// Single-seat subscription with the standard trial and promotion codes enabled
    pub fn new(
        price_id: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            price_id: price_id.into(),
            quantity: 1,
            trial_period_days: Some(Self::TRIAL_PERIOD_DAYS),
            allow_promotion_codes: true,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

/// A hosted checkout session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Session ID (cs_...)
    pub id: String,

    /// Hosted page URL. The provider omits it once the session is complete or expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Customer created or attached by the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl CheckoutSession {
    /// URL to send the browser to
    pub fn redirect_url(&self) -> BillingResult<&str> {
        self.url.as_deref().ok_or(BillingError::MissingField {
            resource: "checkout session",
            field: "url",
        })
    }

    /// Customer the session belongs to
    pub fn customer(&self) -> BillingResult<&str> {
        self.customer_id.as_deref().ok_or(BillingError::MissingField {
            resource: "checkout session",
            field: "customer",
        })
    }
}

/// A hosted billing portal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

/// A shareable payment link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Link ID (plink_...)
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

/// A customer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One priced line of a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub price_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
}

/// A subscription, as carried by lifecycle webhook events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID (sub_...)
    pub id: String,
    pub customer_id: String,
    pub status: String,
    #[serde(default)]
    pub items: Vec<SubscriptionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_end: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Price of the first item, if the subscription has any items
    pub fn first_price_id(&self) -> Option<&str> {
        self.items.first().map(|item| item.price_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_defaults() {
        let checkout = SubscriptionCheckout::new(
            "price_123",
            "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}",
            "http://localhost:4242/cancel.html",
        );

        assert_eq!(checkout.quantity, 1);
        assert_eq!(checkout.trial_period_days, Some(30));
        assert!(checkout.allow_promotion_codes);
    }

    #[test]
    fn test_session_without_url_fails() {
        let session = CheckoutSession {
            id: "cs_test_1".into(),
            url: None,
            customer_id: None,
        };

        assert!(matches!(
            session.redirect_url(),
            Err(BillingError::MissingField { field: "url", .. })
        ));
        assert!(session.customer().is_err());
    }

    #[test]
    fn test_first_price_id() {
        let mut subscription = Subscription {
            id: "sub_1".into(),
            customer_id: "cus_1".into(),
            status: "trialing".into(),
            items: vec![],
            trial_end: None,
        };
        assert_eq!(subscription.first_price_id(), None);

        subscription.items.push(SubscriptionItem {
            id: "si_1".into(),
            price_id: "price_a".into(),
            quantity: Some(1),
        });
        subscription.items.push(SubscriptionItem {
            id: "si_2".into(),
            price_id: "price_b".into(),
            quantity: Some(1),
        });
        assert_eq!(subscription.first_price_id(), Some("price_a"));
    }
}
