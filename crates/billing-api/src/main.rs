//! # billing-server
//!
//! Subscription checkout demo server.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables (or put them in .env)
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//!
//! # Run the server
//! billing-server
//! ```

use billing_api::{routes, state::AppState};
use billing_core::SUBSCRIPTION_EVENTS;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    print_banner();

    // Fails fast when either Stripe secret is missing
    let state = AppState::new()?;

    let addr = state.config.bind_address();
    let domain = state.config.domain.clone();

    info!("Environment: {}", state.config.environment);
    info!("Billing provider: {}", state.provider.provider_name());
    info!("Serving static files from {}", state.config.static_dir);

    if !state.config.is_production() {
        info!("Checkout: POST {}/create-checkout-session", domain);
        info!("Portal: POST {}/create-portal-session", domain);
        info!(
            "Webhook: POST {}/webhook (events: {})",
            domain,
            SUBSCRIPTION_EVENTS.join(", ")
        );
    }

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
  Subscription Checkout Server
  ━━━━━━━━━━━━━━━━━━━━━━━━━━━━
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
