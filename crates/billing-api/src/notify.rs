//! # Trial Reminders
//!
//! Reacts to `customer.subscription.trial_will_end` by preparing a payment
//! link for the customer.

use async_trait::async_trait;
use billing_core::{BillingError, BillingResult, BoxedBillingProvider, Subscription, WebhookHandler};
use tracing::{info, warn};

/// Webhook handler that prepares a payment link when a trial is about to end.
///
/// The link is only logged for now.
pub struct TrialReminderHandler {
    provider: BoxedBillingProvider,
}

impl TrialReminderHandler {
    pub fn new(provider: BoxedBillingProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl WebhookHandler for TrialReminderHandler {
    async fn on_trial_will_end(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription trial will end for {}.", subscription.id);

        let price_id = subscription.first_price_id().ok_or_else(|| {
            BillingError::WebhookParseError(format!(
                "subscription {} has no items",
                subscription.id
            ))
        })?;

        let link = self.provider.create_payment_link(price_id, 1).await?;
        info!("Created payment link {}", link.url);

        let customer = self
            .provider
            .retrieve_customer(&subscription.customer_id)
            .await?;

        // TODO: email the link through a mail provider instead of logging it
        match customer.email {
            Some(email) => info!(
                payment_link = %link.url,
                "Should send payment link to: {}", email
            ),
            None => warn!(
                payment_link = %link.url,
                "Customer {} has no email on file", customer.id
            ),
        }

        Ok(())
    }
}
