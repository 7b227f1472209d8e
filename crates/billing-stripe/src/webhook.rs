//! # Stripe Webhook Verification
//!
//! Checks the `Stripe-Signature` header and decodes the event envelope.
//!
//! The header looks like `t=1492774577,v1=5257a869...,v0=6ffbb59b...`.
//! The signed message is `"{t}.{raw body}"`, signed with HMAC-SHA256 under the
//! endpoint secret; only `v1` signatures count.

use crate::config::StripeConfig;
use crate::types::{StripeEventEnvelope, StripeSubscription};
use billing_core::{
    BillingError, BillingResult, EventPayload, SubscriptionEventKind, WebhookEvent,
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Maximum age of a signed payload, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_signature_header(header: &str) -> BillingResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            // Malformed hex can never match, so it is skipped
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        BillingError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(BillingError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> BillingResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BillingError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verifies signed webhook deliveries for one endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn from_config(config: &StripeConfig) -> Self {
        Self::new(config.webhook_secret.clone())
    }

    /// Check the signature header against the raw payload
    pub fn verify(&self, payload: &[u8], header: &str) -> BillingResult<()> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> BillingResult<()> {
        let parsed = parse_signature_header(header)?;

        // `t` is caller-controlled, so the difference may not fit in an i64
        let within_tolerance = now
            .checked_sub(parsed.timestamp)
            .is_some_and(|age| age.unsigned_abs() <= self.tolerance_secs.unsigned_abs());

        if !within_tolerance {
            return Err(BillingError::WebhookVerificationFailed(
                "Timestamp outside tolerance".to_string(),
            ));
        }

        let mac = signing_mac(&self.secret, parsed.timestamp, payload)?;
        let valid = parsed
            .signatures
            .iter()
            .any(|sig| mac.clone().verify_slice(sig).is_ok());

        if !valid {
            return Err(BillingError::WebhookVerificationFailed(
                "Signature mismatch".to_string(),
            ));
        }

        Ok(())
    }

    /// Verify the signature, then decode the event.
    ///
    /// Subscription lifecycle events must carry a subscription object;
    /// every other type decodes to `EventPayload::Unhandled`.
    pub fn construct_event(&self, payload: &[u8], header: &str) -> BillingResult<WebhookEvent> {
        self.verify(payload, header)?;
        decode_event(payload)
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[redacted]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

fn decode_event(payload: &[u8]) -> BillingResult<WebhookEvent> {
    let envelope: StripeEventEnvelope = serde_json::from_slice(payload).map_err(|e| {
        BillingError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", envelope.event_type);

    let payload = match SubscriptionEventKind::from_event_type(&envelope.event_type) {
        Some(kind) => {
            let subscription: StripeSubscription =
                serde_json::from_value(envelope.data.object).map_err(|e| {
                    BillingError::WebhookParseError(format!(
                        "Error parsing webhook JSON: {}",
                        e
                    ))
                })?;
            EventPayload::Subscription {
                kind,
                subscription: subscription.into(),
            }
        }
        None => EventPayload::Unhandled,
    };

    Ok(WebhookEvent {
        id: envelope.id,
        event_type: envelope.event_type,
        created: DateTime::from_timestamp(envelope.created, 0).unwrap_or_else(Utc::now),
        livemode: envelope.livemode,
        payload,
    })
}

/// Build a valid `Stripe-Signature` header for `payload`.
///
/// Lets tests and local tooling produce deliveries the verifier accepts.
pub fn generate_test_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let signature = signing_mac(secret, timestamp, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("t={},v1={}", timestamp, signature)
}
