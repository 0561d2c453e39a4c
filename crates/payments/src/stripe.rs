//! Stripe implementation of [`PaymentProcessor`] over the
//! PaymentIntents API.
//!
//! Holds map onto manual-capture PaymentIntents: `authorize` creates an
//! intent with `capture_method=manual`, `capture` settles it, `void`
//! cancels it. Stripe's capture and cancel endpoints are idempotent for
//! repeated calls in the same direction, which is exactly the contract
//! [`PaymentProcessor`] asks for.

use async_trait::async_trait;
use serde::Deserialize;

use crate::processor::{AuthorizationRequest, PaymentProcessor, ProcessorError};

const DEFAULT_API_URL: &str = "https://api.stripe.com";

/// Stripe connection configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`).
    pub secret_key: String,
    /// API base URL; overridable to point at stripe-mock in development.
    pub api_url: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default                  |
    /// |---------------------|--------------------------|
    /// | `STRIPE_SECRET_KEY` | (required)               |
    /// | `STRIPE_API_URL`    | `https://api.stripe.com` |
    pub fn from_env() -> Self {
        let secret_key =
            std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set");
        let api_url =
            std::env::var("STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self {
            secret_key,
            api_url,
        }
    }
}

/// HTTP client for the Stripe PaymentIntents API.
pub struct StripeProcessor {
    client: reqwest::Client,
    config: StripeConfig,
}

/// The subset of a PaymentIntent response we care about.
#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
}

impl StripeProcessor {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a processor reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<reqwest::Response, ProcessorError> {
        self.client
            .post(format!("{}{path}", self.config.api_url))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| ProcessorError::Request(e.to_string()))
    }

    /// Map a non-2xx Stripe response to [`ProcessorError::Rejected`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProcessorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProcessorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<String, ProcessorError> {
        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("capture_method", "manual".to_string()),
            ("metadata[dip_id]", request.dip_id.to_string()),
            ("metadata[claimer_id]", request.claimer_id.to_string()),
            ("metadata[owner_id]", request.owner_id.to_string()),
            ("metadata[platform_fee]", request.platform_fee.to_string()),
        ];

        let response = self.post_form("/v1/payment_intents", &form).await?;
        let response = Self::ensure_success(response).await?;
        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| ProcessorError::Malformed(e.to_string()))?;

        tracing::info!(
            reference = %intent.id,
            dip_id = %request.dip_id,
            amount = request.amount,
            "Placed payment hold"
        );
        Ok(intent.id)
    }

    async fn capture(&self, reference: &str) -> Result<(), ProcessorError> {
        let response = self
            .post_form(&format!("/v1/payment_intents/{reference}/capture"), &[])
            .await?;
        Self::ensure_success(response).await?;
        tracing::info!(reference, "Captured payment hold");
        Ok(())
    }

    async fn void(&self, reference: &str) -> Result<(), ProcessorError> {
        let response = self
            .post_form(&format!("/v1/payment_intents/{reference}/cancel"), &[])
            .await?;
        Self::ensure_success(response).await?;
        tracing::info!(reference, "Voided payment hold");
        Ok(())
    }
}
