//! # Stripe REST Client
//!
//! `BillingProvider` implementation over the Stripe REST API.
//! Requests are form-encoded, responses JSON.

use crate::config::StripeConfig;
use crate::types::{
    StripeCheckoutSession, StripeCustomer, StripeError, StripeErrorResponse, StripeList,
    StripePaymentLink, StripePortalSession, StripePrice,
};
use async_trait::async_trait;
use billing_core::{
    BillingError, BillingProvider, BillingResult, CheckoutSession, Customer, PaymentLink,
    PortalSession, Price, SubscriptionCheckout,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const PROVIDER: &str = "stripe";
const PAGE_LIMIT: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type FormParams = Vec<(String, String)>;

/// Stripe API client
///
/// Holds the account credentials explicitly; nothing is read from global state
/// after construction.
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(config: StripeConfig) -> BillingResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                BillingError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &FormParams) -> BillingResult<T> {
        let request = self.authorized(self.client.get(self.url(path))).query(query);
        self.send(request).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &FormParams) -> BillingResult<T> {
        let request = self
            .authorized(self.client.post(self.url(path)))
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(form);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> BillingResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| BillingError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            let message = match serde_json::from_str::<StripeErrorResponse>(&body) {
                Ok(error_response) => describe_error(&error_response.error),
                Err(_) => format!("HTTP {}: {}", status, body),
            };

            return Err(BillingError::ProviderError {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            BillingError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    #[instrument(skip(self))]
    async fn list_prices(&self, lookup_key: &str) -> BillingResult<Vec<Price>> {
        let mut prices = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query: FormParams = vec![
                ("lookup_keys[]".to_string(), lookup_key.to_string()),
                ("active".to_string(), "true".to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after".to_string(), cursor.clone()));
            }

            let page: StripeList<StripePrice> = self.get("/v1/prices", &query).await?;
            let has_more = page.has_more;
            starting_after = page.data.last().map(|p| p.id.clone());
            prices.extend(page.data.into_iter().map(Price::from));

            if !has_more || starting_after.is_none() {
                break;
            }
        }

        debug!("Listed {} prices for lookup key {}", prices.len(), lookup_key);
        Ok(prices)
    }

    #[instrument(skip(self, checkout), fields(price_id = %checkout.price_id))]
    async fn create_checkout_session(
        &self,
        checkout: &SubscriptionCheckout,
    ) -> BillingResult<CheckoutSession> {
        let mut form: FormParams = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("success_url".to_string(), checkout.success_url.clone()),
            ("cancel_url".to_string(), checkout.cancel_url.clone()),
            ("line_items[0][price]".to_string(), checkout.price_id.clone()),
            (
                "line_items[0][quantity]".to_string(),
                checkout.quantity.to_string(),
            ),
            (
                "allow_promotion_codes".to_string(),
                checkout.allow_promotion_codes.to_string(),
            ),
        ];
        if let Some(days) = checkout.trial_period_days {
            form.push((
                "subscription_data[trial_period_days]".to_string(),
                days.to_string(),
            ));
        }

        let session: StripeCheckoutSession = self.post("/v1/checkout/sessions", &form).await?;
        info!("Created Stripe checkout session: id={}", session.id);

        Ok(session.into())
    }

    #[instrument(skip(self))]
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> BillingResult<CheckoutSession> {
        let not_found = || BillingError::SessionNotFound {
            session_id: session_id.to_string(),
        };

        if !is_valid_id(session_id) {
            return Err(not_found());
        }

        let path = format!("/v1/checkout/sessions/{}", session_id);
        let session = match self.get::<StripeCheckoutSession>(&path, &Vec::new()).await {
            Err(BillingError::ProviderError { status: 404, .. }) => return Err(not_found()),
            other => other?,
        };

        Ok(session.into())
    }

    #[instrument(skip(self))]
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> BillingResult<PortalSession> {
        let form: FormParams = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];

        let session: StripePortalSession =
            self.post("/v1/billing_portal/sessions", &form).await?;
        info!("Created billing portal session: id={}", session.id);

        Ok(session.into())
    }

    #[instrument(skip(self))]
    async fn create_payment_link(
        &self,
        price_id: &str,
        quantity: u32,
    ) -> BillingResult<PaymentLink> {
        let form: FormParams = vec![
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), quantity.to_string()),
        ];

        let link: StripePaymentLink = self.post("/v1/payment_links", &form).await?;
        info!("Created Payment Link: id={}, url={}", link.id, link.url);

        Ok(link.into())
    }

    #[instrument(skip(self))]
    async fn retrieve_customer(&self, customer_id: &str) -> BillingResult<Customer> {
        if !is_valid_id(customer_id) {
            return Err(BillingError::InvalidRequest(format!(
                "Malformed customer id: {:?}",
                customer_id
            )));
        }

        let path = format!("/v1/customers/{}", customer_id);
        let customer: StripeCustomer = self.get(&path, &Vec::new()).await?;

        Ok(customer.into())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Stripe object IDs are `prefix_` followed by alphanumerics.
/// Anything else must not be spliced into a request path.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn describe_error(err: &StripeError) -> String {
    let message = err.message.as_deref().unwrap_or("no message");
    match (&err.error_type, &err.code) {
        (Some(kind), Some(code)) => format!("{} ({}/{})", message, kind, code),
        (Some(kind), None) => format!("{} ({})", message, kind),
        (None, Some(code)) => format!("{} ({})", message, code),
        (None, None) => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{
        body_string_contains, header, header_exists, method, path, query_param,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> StripeClient {
        let config =
            StripeConfig::new("sk_test_abc123", "whsec_secret").with_api_base_url(server.uri());
        StripeClient::new(config).unwrap()
    }

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("cs_test_a1B2c3"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("cs_test/../../v1/customers"));
        assert!(!is_valid_id("cs test"));
    }

    #[tokio::test]
    async fn test_list_prices_follows_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/prices"))
            .and(query_param("lookup_keys[]", "pro_monthly"))
            .and(query_param("starting_after", "price_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{ "id": "price_3", "lookup_key": "pro_monthly", "active": true }],
                "has_more": false
            })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/prices"))
            .and(query_param("lookup_keys[]", "pro_monthly"))
            .and(query_param("active", "true"))
            .and(header("Authorization", "Bearer sk_test_abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    { "id": "price_1", "lookup_key": "pro_monthly", "active": true },
                    { "id": "price_2", "lookup_key": "pro_monthly", "active": true }
                ],
                "has_more": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let prices = client.list_prices("pro_monthly").await.unwrap();

        let ids: Vec<_> = prices.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["price_1", "price_2", "price_3"]);
    }

    #[tokio::test]
    async fn test_create_checkout_session_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header_exists("Idempotency-Key"))
            .and(body_string_contains("mode=subscription"))
            .and(body_string_contains("allow_promotion_codes=true"))
            .and(body_string_contains("subscription_data%5Btrial_period_days%5D=30"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "object": "checkout.session",
                "url": "https://checkout.stripe.com/c/pay/cs_test_1",
                "customer": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let checkout = SubscriptionCheckout::new(
            "price_123",
            "http://localhost:4242/success.html?session_id={CHECKOUT_SESSION_ID}",
            "http://localhost:4242/cancel.html",
        );
        let session = client.create_checkout_session(&checkout).await.unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert_eq!(
            session.redirect_url().unwrap(),
            "https://checkout.stripe.com/c/pay/cs_test_1"
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_typed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_links"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "No such price: 'price_missing'",
                    "type": "invalid_request_error",
                    "code": "resource_missing"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.create_payment_link("price_missing", 1).await.unwrap_err();

        match err {
            BillingError::ProviderError { status, message, .. } => {
                assert_eq!(status, 400);
                assert!(message.contains("No such price"));
                assert!(message.contains("resource_missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_retrieve_missing_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "message": "No such checkout.session", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let err = client.retrieve_checkout_session("cs_test_gone").await.unwrap_err();
        assert!(matches!(err, BillingError::SessionNotFound { .. }));

        // Never reaches the network
        let err = client.retrieve_checkout_session("").await.unwrap_err();
        assert!(matches!(err, BillingError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_portal_and_customer() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "url": null,
                "customer": "cus_1"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/billing_portal/sessions"))
            .and(body_string_contains("customer=cus_1"))
            .and(body_string_contains("return_url=http%3A%2F%2Flocalhost%3A4242"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "bps_1",
                "url": "https://billing.stripe.com/p/session/bps_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/customers/cus_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cus_1",
                "object": "customer",
                "email": "jenny@example.com"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let session = client.retrieve_checkout_session("cs_test_1").await.unwrap();
        let portal = client
            .create_portal_session(session.customer().unwrap(), "http://localhost:4242")
            .await
            .unwrap();
        assert_eq!(portal.url, "https://billing.stripe.com/p/session/bps_1");

        let customer = client.retrieve_customer("cus_1").await.unwrap();
        assert_eq!(customer.email.as_deref(), Some("jenny@example.com"));
    }
}
