//! # Billing Error Types
//!
//! Typed error handling for the subscription checkout server.
//! Every provider call returns `Result<T, BillingError>`.

use thiserror::Error;

/// Core error type for all billing operations
#[derive(Debug, Error)]
pub enum BillingError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No active price carries the lookup key
    #[error("No active price found for lookup key: {lookup_key}")]
    PriceNotFound { lookup_key: String },

    /// More than one active price carries the lookup key
    #[error("Lookup key {lookup_key} matches {count} active prices")]
    AmbiguousPrice { lookup_key: String, count: usize },

    /// Checkout session missing or unknown
    #[error("Checkout session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Provider returned a resource without a field we depend on
    #[error("{resource} is missing {field}")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },

    /// Payment provider API error
    #[error("Provider error [{provider}] (HTTP {status}): {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Request body exceeded the accepted size
    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BillingError::Configuration(_) => 500,
            BillingError::InvalidRequest(_) => 400,
            BillingError::PriceNotFound { .. } => 404,
            BillingError::AmbiguousPrice { .. } => 409,
            BillingError::SessionNotFound { .. } => 404,
            BillingError::MissingField { .. } => 502,
            BillingError::ProviderError { .. } => 502,
            BillingError::NetworkError(_) => 503,
            BillingError::WebhookVerificationFailed(_) => 400,
            BillingError::WebhookParseError(_) => 400,
            BillingError::PayloadTooLarge { .. } => 503,
            BillingError::Serialization(_) => 500,
            BillingError::Internal(_) => 500,
        }
    }

    /// Whether the error message is safe to echo back to the caller.
    ///
    /// Provider, network and internal failures carry upstream detail that
    /// stays in the server logs.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BillingError::InvalidRequest(_)
                | BillingError::PriceNotFound { .. }
                | BillingError::AmbiguousPrice { .. }
                | BillingError::SessionNotFound { .. }
                | BillingError::WebhookVerificationFailed(_)
                | BillingError::WebhookParseError(_)
                | BillingError::PayloadTooLarge { .. }
        )
    }
}

/// Result type alias for billing operations
pub type BillingResult<T> = Result<T, BillingError>;
