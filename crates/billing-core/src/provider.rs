//! # Billing Provider Trait
//!
//! The seam between the HTTP handlers and the remote billing API.
//! Production uses the Stripe REST client; tests plug in a recording mock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   BillingProvider (trait)                   │
//! │  ├── list_prices()               GET  /v1/prices            │
//! │  ├── create_checkout_session()   POST /v1/checkout/sessions │
//! │  ├── retrieve_checkout_session() GET  /v1/checkout/...      │
//! │  ├── create_portal_session()     POST /v1/billing_portal/...│
//! │  ├── create_payment_link()       POST /v1/payment_links     │
//! │  └── retrieve_customer()         GET  /v1/customers/{id}    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::error::BillingResult;
use crate::model::{
    CheckoutSession, Customer, PaymentLink, PortalSession, Price, SubscriptionCheckout,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Remote operations the server forwards to the billing provider.
///
/// Every call returns a typed result; callers decide how each failure maps
/// to a response.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// List every active price carrying `lookup_key`, across all pages.
    async fn list_prices(&self, lookup_key: &str) -> BillingResult<Vec<Price>>;

    /// Create a hosted checkout session.
    async fn create_checkout_session(
        &self,
        checkout: &SubscriptionCheckout,
    ) -> BillingResult<CheckoutSession>;

    /// Fetch an existing checkout session.
    async fn retrieve_checkout_session(&self, session_id: &str)
        -> BillingResult<CheckoutSession>;

    /// Create a billing portal session for `customer_id`.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> BillingResult<PortalSession>;

    /// Create a payment link selling `quantity` of `price_id`.
    async fn create_payment_link(&self, price_id: &str, quantity: u32)
        -> BillingResult<PaymentLink>;

    /// Fetch a customer record.
    async fn retrieve_customer(&self, customer_id: &str) -> BillingResult<Customer>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared billing provider (dynamic dispatch)
pub type BoxedBillingProvider = Arc<dyn BillingProvider>;

/// Redirect targets handed to the provider's hosted pages
#[derive(Debug, Clone)]
pub struct RedirectUrls {
    /// Public origin of this server (e.g., "http://localhost:4242")
    pub domain: String,
    /// Page shown after a completed checkout
    pub success_path: String,
    /// Page shown when the customer abandons checkout
    pub cancel_path: String,
}

impl RedirectUrls {
    /// Placeholder the provider substitutes with the real session ID
    pub const SESSION_ID_PLACEHOLDER: &'static str = "{CHECKOUT_SESSION_ID}";

    pub fn new(domain: impl Into<String>) -> Self {
        let domain: String = domain.into();
        Self {
            domain: domain.trim_end_matches('/').to_string(),
            success_path: "/success.html".to_string(),
            cancel_path: "/cancel.html".to_string(),
        }
    }

    /// Success URL carrying the session ID placeholder
    pub fn success_url(&self) -> String {
        format!(
            "{}{}?session_id={}",
            self.domain,
            self.success_path,
            Self::SESSION_ID_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}", self.domain, self.cancel_path)
    }

    /// Where the billing portal sends the customer back to
    pub fn portal_return_url(&self) -> String {
        self.domain.clone()
    }

    /// Checkout parameters for `price_id` using these redirect targets
    pub fn checkout_for(&self, price_id: impl Into<String>) -> SubscriptionCheckout {
        SubscriptionCheckout::new(price_id, self.success_url(), self.cancel_url())
    }
}

impl Default for RedirectUrls {
    fn default() -> Self {
        Self::new("http://localhost:4242")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_urls() {
        let urls = RedirectUrls::new("http://localhost:4242/");

        assert_eq!(
            urls.success_url(),
            "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(urls.cancel_url(), "http://localhost:4242/cancel.html");
        assert_eq!(urls.portal_return_url(), "http://localhost:4242");
    }

    #[test]
    fn test_checkout_for() {
        let checkout = RedirectUrls::default().checkout_for("price_123");

        assert_eq!(checkout.price_id, "price_123");
        assert_eq!(checkout.cancel_url, "http://localhost:4242/cancel.html");
        assert!(checkout.success_url.ends_with("{CHECKOUT_SESSION_ID}"));
    }
}
