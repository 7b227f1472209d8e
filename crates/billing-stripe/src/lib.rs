//! # billing-stripe
//!
//! Stripe integration for the subscription checkout server.
//!
//! - **StripeClient** - `BillingProvider` over the Stripe REST API
//!   (prices, Checkout Sessions, Billing Portal, Payment Links, Customers)
//! - **WebhookVerifier** - `Stripe-Signature` verification and event decoding
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use billing_core::{select_price, BillingProvider, RedirectUrls};
//! use billing_stripe::StripeClient;
//!
//! let client = StripeClient::from_env()?;
//! let price = select_price("pro_monthly", client.list_prices("pro_monthly").await?)?;
//! let session = client
//!     .create_checkout_session(&RedirectUrls::default().checkout_for(price.id))
//!     .await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use billing_core::{dispatch_webhook_event, WebhookHandler};
//! use billing_stripe::WebhookVerifier;
//!
//! // Every event is logged by the trait's default methods
//! struct EventLog;
//! impl WebhookHandler for EventLog {}
//!
//! let verifier = WebhookVerifier::from_config(client.config());
//! let event = verifier.construct_event(&body, signature)?;
//! dispatch_webhook_event(&EventLog, &event).await?;
//! ```

pub mod client;
pub mod config;
mod types;
pub mod webhook;

// Re-exports
pub use client::StripeClient;
pub use config::StripeConfig;
pub use webhook::{generate_test_header, WebhookVerifier, SIGNATURE_HEADER};
