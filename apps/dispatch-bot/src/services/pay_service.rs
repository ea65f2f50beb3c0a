use std::sync::Arc;

use async_trait::async_trait;
use dispatch_db::models::payment::{Payment, PaymentStatus};
use dispatch_db::{PaymentStore, StoreError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("malformed gateway response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("gateway response has no confirmation url")]
    MissingConfirmationUrl,
    #[error("payment store: {0}")]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a gateway payment for the order and returns its confirmation URL.
    async fn create_payment(&self, order_id: i64) -> Result<String, GatewayError>;

    /// Refreshes the stored status from the gateway.
    async fn check_payment(&self, payment: Payment) -> Result<Payment, GatewayError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Amount {
    value: String,
    currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Confirmation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<String>,
    #[serde(default, skip_serializing)]
    confirmation_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest {
    amount: Amount,
    capture: bool,
    confirmation: Confirmation,
    description: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: Uuid,
    status: PaymentStatus,
    #[serde(default)]
    confirmation: Option<Confirmation>,
}

#[derive(Clone)]
pub struct PayService {
    client: Client,
    store: Arc<dyn PaymentStore>,
    gateway: GatewayConfig,
}

impl PayService {
    pub fn new(client: Client, store: Arc<dyn PaymentStore>, gateway: GatewayConfig) -> Self {
        Self {
            client,
            store,
            gateway,
        }
    }

    fn new_request(&self) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount: Amount {
                value: self.gateway.amount.clone(),
                currency: self.gateway.currency.clone(),
            },
            capture: true,
            confirmation: Confirmation {
                kind: "redirect".to_string(),
                return_url: Some(self.gateway.return_url.clone()),
                confirmation_url: None,
            },
            description: self.gateway.description.clone(),
        }
    }

    fn payment_url(&self, payment_id: Uuid) -> String {
        format!(
            "{}/{}",
            self.gateway.payments_url.trim_end_matches('/'),
            payment_id
        )
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), GatewayError> {
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl PaymentProcessor for PayService {
    async fn create_payment(&self, order_id: i64) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.gateway.payments_url)
            .basic_auth(&self.gateway.shop_id, Some(&self.gateway.secret_key))
            .header("Idempotence-Key", Uuid::new_v4().to_string())
            .json(&self.new_request())
            .send()
            .await?;

        let (status, body) = Self::read_body(response).await?;
        if status != StatusCode::OK {
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let created: PaymentResponse = serde_json::from_str(&body)?;
        let confirmation_url = created
            .confirmation
            .and_then(|c| c.confirmation_url)
            .ok_or(GatewayError::MissingConfirmationUrl)?;

        let payment = Payment {
            id: created.id,
            order_id,
            status: PaymentStatus::Pending,
            confirmation_url: confirmation_url.clone(),
        };
        self.store.payment_create(&payment).await?;
        tracing::info!(payment_id = %payment.id, order_id, "Payment created");

        Ok(confirmation_url)
    }

    async fn check_payment(&self, mut payment: Payment) -> Result<Payment, GatewayError> {
        let response = self
            .client
            .get(self.payment_url(payment.id))
            .basic_auth(&self.gateway.shop_id, Some(&self.gateway.secret_key))
            .send()
            .await?;

        let (status, body) = Self::read_body(response).await?;
        if status == StatusCode::NOT_FOUND {
            self.store
                .payment_set_status(payment.id, PaymentStatus::Canceled)
                .await?;
            payment.status = PaymentStatus::Canceled;
            return Ok(payment);
        }
        if status != StatusCode::OK {
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let current: PaymentResponse = serde_json::from_str(&body)?;
        self.store
            .payment_set_status(payment.id, current.status)
            .await?;
        payment.status = current.status;
        Ok(payment)
    }
}
