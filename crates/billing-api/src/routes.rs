//! # Routes
//!
//! Axum router configuration for the checkout server.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Create the main application router
///
/// Routes:
/// - POST /create-checkout-session - Start a subscription checkout
/// - POST /create-portal-session - Open the billing portal
/// - POST /webhook - Stripe webhook handler (raw body, signed)
/// - GET  /health - Health check
/// - everything else - static front-end files
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route(
            "/create-portal-session",
            post(handlers::create_portal_session),
        )
        .route("/webhook", post(handlers::stripe_webhook))
        .fallback_service(static_files)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
