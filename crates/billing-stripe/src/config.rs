//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! All secrets are loaded from environment variables; none live in source.

use billing_core::BillingError;
use std::env;
use std::fmt;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_..., sk_live_... or a restricted rk_ key)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    ///
    /// Optional:
    /// - `STRIPE_API_BASE` (defaults to the public API)
    pub fn from_env() -> Result<Self, BillingError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            BillingError::Configuration("STRIPE_SECRET_KEY not set".to_string())
        })?;

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            BillingError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        let mut config = Self::new(secret_key, webhook_secret);
        if let Ok(base) = env::var("STRIPE_API_BASE") {
            config = config.with_api_base_url(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Check key formats
    pub fn validate(&self) -> Result<(), BillingError> {
        const KEY_PREFIXES: [&str; 4] = ["sk_test_", "sk_live_", "rk_test_", "rk_live_"];

        if !KEY_PREFIXES.iter().any(|p| self.secret_key.starts_with(p)) {
            return Err(BillingError::Configuration(
                "STRIPE_SECRET_KEY must start with sk_test_, sk_live_, rk_test_ or rk_live_"
                    .to_string(),
            ));
        }

        if !self.webhook_secret.starts_with("whsec_") {
            return Err(BillingError::Configuration(
                "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.contains("_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[redacted]")
            .field("webhook_secret", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());

        let config = StripeConfig::new("rk_live_abc123", "whsec_secret");
        assert!(config.validate().is_ok());
        assert!(!config.is_test_mode());

        let config = StripeConfig::new("pk_test_abc123", "whsec_secret");
        assert!(config.validate().is_err());

        let config = StripeConfig::new("sk_test_abc123", "secret");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("sk_test_abc123"));
        assert!(!debug.contains("whsec_secret"));
        assert!(debug.contains("api.stripe.com"));
    }

    #[test]
    fn test_api_base_url_override() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret")
            .with_api_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }
}
