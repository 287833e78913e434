//! HTTP client for the PingPay checkout API.

use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::Money;
use serde::Deserialize;
use serde_json::json;

use crate::error::PaymentError;
use crate::gateway::{CheckoutSession, PaymentGateway, SessionStatus};

/// Production API base.
pub const DEFAULT_BASE_URL: &str = "https://pay.pingpay.io/api";

const CREATE_TIMEOUT: Duration = Duration::from_secs(15);
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// PingPay checkout client.
///
/// Sessions are denominated in the settlement asset (USDC on NEAR); amounts
/// are sent in minor units.
#[derive(Debug, Clone)]
pub struct PingPayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(default, rename = "sessionUrl")]
    session_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "paymentId")]
    payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    session: SessionBody,
    #[serde(default, rename = "sessionUrl")]
    session_url: Option<String>,
}

impl PingPayClient {
    /// Creates a client against the production API.
    pub fn new(api_key: impl Into<String>, app_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            app_url: app_url.into(),
        }
    }

    /// Overrides the API base URL (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn error_for(response: reqwest::Response) -> PaymentError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|_| "no body".to_string());
        PaymentError::Api { status, body }
    }
}

#[async_trait]
impl PaymentGateway for PingPayClient {
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    async fn create_session(
        &self,
        amount: Money,
        order_id: &OrderId,
    ) -> Result<CheckoutSession, PaymentError> {
        let body = json!({
            "amount": amount.usdc_units().to_string(),
            "asset": { "chain": "NEAR", "symbol": "USDC" },
            "successUrl": format!("{}/payment/callback?orderId={order_id}", self.app_url),
            "cancelUrl": format!("{}/checkout/{order_id}", self.app_url),
            "metadata": { "orderId": order_id },
        });

        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .timeout(CREATE_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let envelope: SessionEnvelope = response.json().await?;
        let session_url = envelope
            .session_url
            .or(envelope.session.session_url)
            .ok_or_else(|| PaymentError::Malformed("missing sessionUrl".to_string()))?;

        Ok(CheckoutSession {
            session_id: envelope.session.session_id,
            session_url,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        let response = self
            .http
            .get(format!("{}/checkout/sessions/{session_id}", self.base_url))
            .header("x-publishable-key", &self.api_key)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let envelope: SessionEnvelope = response.json().await?;
        Ok(SessionStatus {
            status: envelope.session.status.unwrap_or_default(),
            payment_id: envelope.session.payment_id,
        })
    }
}
