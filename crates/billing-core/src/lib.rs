//! # billing-core
//!
//! Core types and traits for the subscription checkout server.
//!
//! This crate provides:
//! - `BillingProvider` trait for the remote billing API
//! - `Price`, `CheckoutSession`, `Subscription` and friends
//! - `select_price` for resolving a lookup key
//! - `WebhookEvent` and the `WebhookHandler` dispatch trait
//! - `BillingError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use billing_core::{select_price, BillingProvider, RedirectUrls};
//!
//! let urls = RedirectUrls::new("http://localhost:4242");
//! let price = select_price("pro_monthly", provider.list_prices("pro_monthly").await?)?;
//! let session = provider.create_checkout_session(&urls.checkout_for(price.id)).await?;
//!
//! // Redirect user to session.redirect_url()?
//! ```

pub mod error;
pub mod model;
pub mod pricing;
pub mod provider;
pub mod webhook;

// Re-exports for convenience
pub use error::{BillingError, BillingResult};
pub use model::{
    CheckoutSession, Customer, PaymentLink, PortalSession, Price, Subscription,
    SubscriptionCheckout, SubscriptionItem,
};
pub use pricing::select_price;
pub use provider::{BillingProvider, BoxedBillingProvider, RedirectUrls};
pub use webhook::{
    dispatch_webhook_event, EventPayload, SubscriptionEventKind,
    WebhookEvent, WebhookHandler, SUBSCRIPTION_EVENTS,
};
