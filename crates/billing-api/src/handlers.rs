//! # Request Handlers
//!
//! Axum request handlers for the checkout, billing portal and webhook endpoints.
//! Each one forwards to the billing provider and relays the result.

use crate::notify::TrialReminderHandler;
use crate::state::{AppConfig, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use billing_core::{dispatch_webhook_event, select_price, BillingError};
use billing_stripe::SIGNATURE_HEADER;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Form posted by the pricing page
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    /// Price lookup key (lookup keys can only be set through the API)
    #[serde(default)]
    pub lookup_key: String,
}

/// Form posted by the success page
#[derive(Debug, Deserialize)]
pub struct PortalForm {
    /// Checkout session ID returned to the success page
    #[serde(default)]
    pub session_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

/// Handler error carrying the status and the caller-facing message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Upstream detail stays in the logs
        let message = if err.is_client_error() {
            err.to_string()
        } else {
            match status {
                StatusCode::BAD_GATEWAY => "Payment provider request failed".to_string(),
                StatusCode::SERVICE_UNAVAILABLE => "Payment provider unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        };

        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.message, self.status.as_u16());
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "billing-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a subscription checkout session and redirect to it
#[instrument(skip(state, form), fields(lookup_key = %form.lookup_key))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect, ApiError> {
    let lookup_key = form.lookup_key.trim();
    if lookup_key.is_empty() {
        return Err(BillingError::InvalidRequest("lookup_key is required".to_string()).into());
    }

    let prices = state.provider.list_prices(lookup_key).await.map_err(|e| {
        error!("Failed to list prices: {}", e);
        e
    })?;
    let price = select_price(lookup_key, prices).map_err(|e| {
        warn!("Price lookup failed: {}", e);
        e
    })?;

    let checkout = state.urls.checkout_for(price.id);
    let session = state
        .provider
        .create_checkout_session(&checkout)
        .await
        .map_err(|e| {
            error!("Failed to create checkout session: {}", e);
            e
        })?;

    let url = session.redirect_url().map_err(|e| {
        error!("Checkout session {} has no URL", session.id);
        e
    })?;

    info!("Redirecting to checkout session {}", session.id);
    Ok(Redirect::to(url))
}

/// Create a billing portal session for the customer behind a checkout session
#[instrument(skip(state, form), fields(session_id = %form.session_id))]
pub async fn create_portal_session(
    State(state): State<AppState>,
    Form(form): Form<PortalForm>,
) -> Result<Redirect, ApiError> {
    let session_id = form.session_id.trim();

    // The checkout session stands in for the signed-in user here. A real
    // deployment resolves the customer from its own authenticated account.
    let session = if session_id.is_empty() {
        Err(BillingError::SessionNotFound {
            session_id: String::new(),
        })
    } else {
        state.provider.retrieve_checkout_session(session_id).await
    };

    let lookup_failed = |e: BillingError| {
        error!("Failed to retrieve checkout session {:?}: {}", session_id, e);
        ApiError::internal("Failed to retrieve checkout session")
    };
    let session = session.map_err(lookup_failed)?;
    let customer_id = session.customer().map_err(lookup_failed)?;

    let portal = state
        .provider
        .create_portal_session(customer_id, &state.urls.portal_return_url())
        .await
        .map_err(|e| {
            error!("Failed to create portal session: {}", e);
            e
        })?;

    info!("Redirecting customer {} to billing portal", customer_id);
    Ok(Redirect::to(&portal.url))
}

/// Handle Stripe webhook
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let limit = AppConfig::WEBHOOK_BODY_LIMIT;
    let payload = axum::body::to_bytes(body, limit).await.map_err(|e| {
        error!("Error reading request body: {}", e);
        ApiError::from(BillingError::PayloadTooLarge { limit })
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook without Stripe-Signature header");
            ApiError::from(BillingError::WebhookVerificationFailed(
                "Missing Stripe-Signature header".to_string(),
            ))
        })?;

    let event = state
        .verifier
        .construct_event(&payload, signature)
        .map_err(|e| {
            warn!("Webhook rejected: {}", e);
            e
        })?;

    info!(
        "Received webhook: type={}, id={}, livemode={}",
        event.event_type, event.id, event.livemode
    );

    let handler = TrialReminderHandler::new(state.provider.clone());
    dispatch_webhook_event(&handler, &event)
        .await
        .map_err(|e| {
            error!("Webhook handler error for {}: {}", event.id, e);
            // A 5xx makes Stripe redeliver the event
            if e.is_client_error() {
                ApiError::from(e)
            } else {
                ApiError::internal("Webhook handler failed")
            }
        })?;

    Ok(StatusCode::OK)
}
