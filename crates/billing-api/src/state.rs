//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the billing provider, the webhook verifier and server configuration.

use anyhow::Context;
use billing_core::{BoxedBillingProvider, RedirectUrls};
use billing_stripe::{StripeClient, StripeConfig, WebhookVerifier};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/server.toml";

/// Application configuration
///
/// Non-secret settings only. Stripe credentials come from `StripeConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public origin used to build redirect URLs
    pub domain: String,
    /// Directory holding the front-end assets
    pub static_dir: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Largest webhook body accepted, in bytes
    pub const WEBHOOK_BODY_LIMIT: usize = 65_536;

    /// Load `.env`, then the optional TOML file, then environment overrides.
    ///
    /// The file path is `BILLING_CONFIG` if set, else `config/server.toml`.
    /// A missing default file is fine; a missing explicit file is an error.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("BILLING_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path))?;
        info!("Loaded server config from {}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `HOST`, `PORT`, `DOMAIN`, `STATIC_DIR` and `ENVIRONMENT`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        if let Some(domain) = lookup("DOMAIN") {
            self.domain = domain;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            self.static_dir = dir;
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            self.environment = env;
        }
        Ok(())
    }

    /// Address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4242,
            domain: "http://localhost:4242".to_string(),
            static_dir: "public".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Remote billing API
    pub provider: BoxedBillingProvider,
    /// Webhook signature verifier
    pub verifier: Arc<WebhookVerifier>,
    /// Redirect targets for hosted pages
    pub urls: RedirectUrls,
    /// Application config
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new AppState backed by the Stripe API
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::load()?;

        let stripe_config = StripeConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        info!(
            "Stripe mode: {}",
            if stripe_config.is_test_mode() { "test" } else { "live" }
        );
        let verifier = WebhookVerifier::from_config(&stripe_config);
        let client = StripeClient::new(stripe_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::with_provider(config, Arc::new(client), verifier))
    }

    /// Assemble state around an explicit provider (used by tests with a mock)
    pub fn with_provider(
        config: AppConfig,
        provider: BoxedBillingProvider,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            provider,
            verifier: Arc::new(verifier),
            urls: RedirectUrls::new(&config.domain),
            config: Arc::new(config),
        }
    }
}
