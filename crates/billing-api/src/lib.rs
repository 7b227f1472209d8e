//! # billing-api
//!
//! HTTP layer for the subscription checkout server.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Checkout and billing portal redirects
//! - Stripe webhook endpoint with trial-ending reminders
//! - Static hosting for the front-end
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/create-checkout-session` | Redirect to hosted checkout |
//! | POST | `/create-portal-session` | Redirect to billing portal |
//! | POST | `/webhook` | Stripe webhook |
//! | GET | `/*` | Static files |

pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
