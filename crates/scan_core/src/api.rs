//! Remote API seam for the scan workflows.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use shared::{
    domain::OrderId,
    error::ScanFailure,
    protocol::{
        ApiEnvelope, AssignOrderRequest, CashHandoverRequest, HoldOrderRequest,
        ReturnOrderRequest, SignatureUploadRequest, VerifyOfficerRequest,
    },
};

use crate::classify;

/// Bounded timeout for every order/cash request.
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One operation per scan workflow. Implementations report failures already
/// classified into the user-facing taxonomy; the controller never sees raw
/// transport errors.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    async fn assign_order(&self, invoice_no: &str) -> Result<(), ScanFailure>;
    async fn hold_order(&self, invoice_no: &str) -> Result<(), ScanFailure>;
    async fn return_order(&self, invoice_no: &str) -> Result<(), ScanFailure>;
    async fn hand_over_cash(&self, officer_id: &str) -> Result<(), ScanFailure>;
    async fn verify_officer(&self, officer_id: &str) -> Result<(), ScanFailure>;
    async fn upload_signature(
        &self,
        order_id: OrderId,
        signature_png: &[u8],
    ) -> Result<(), ScanFailure>;
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Bearer-token JSON client for the delivery backend.
pub struct HttpDeliveryApi {
    http: Client,
    base_url: Url,
    bearer_token: String,
}

impl HttpDeliveryApi {
    pub fn new(
        base_url: &str,
        bearer_token: impl Into<String>,
    ) -> Result<Self, ApiClientError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last path segment without this.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let http = Client::builder().timeout(API_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            bearer_token: bearer_token.into(),
        })
    }

    async fn post_envelope<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ScanFailure> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ScanFailure::Network(err.to_string()))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(transport_failure)?;
        let envelope = match serde_json::from_str::<ApiEnvelope>(&body_text) {
            Ok(envelope) => envelope,
            // Non-JSON bodies (proxies, crashes) still feed the classifier.
            Err(_) => {
                let trimmed = body_text.trim();
                ApiEnvelope {
                    status: "error".to_string(),
                    message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
                }
            }
        };

        if (200..300).contains(&status) && envelope.is_success() {
            return Ok(());
        }

        Err(classify::classify_response(
            status,
            envelope.message.as_deref().unwrap_or_default(),
        ))
    }
}

fn transport_failure(err: reqwest::Error) -> ScanFailure {
    if err.is_timeout() {
        ScanFailure::Network("request timed out".to_string())
    } else {
        ScanFailure::Network(err.to_string())
    }
}

#[async_trait]
impl DeliveryApi for HttpDeliveryApi {
    async fn assign_order(&self, invoice_no: &str) -> Result<(), ScanFailure> {
        self.post_envelope(
            "order/assign",
            &AssignOrderRequest {
                invoice_no: invoice_no.to_string(),
            },
        )
        .await
    }

    async fn hold_order(&self, invoice_no: &str) -> Result<(), ScanFailure> {
        self.post_envelope(
            "order/hold",
            &HoldOrderRequest {
                invoice_no: invoice_no.to_string(),
            },
        )
        .await
    }

    async fn return_order(&self, invoice_no: &str) -> Result<(), ScanFailure> {
        self.post_envelope(
            "order/return",
            &ReturnOrderRequest {
                invoice_no: invoice_no.to_string(),
            },
        )
        .await
    }

    async fn hand_over_cash(&self, officer_id: &str) -> Result<(), ScanFailure> {
        self.post_envelope(
            "cash/handover",
            &CashHandoverRequest {
                officer_id: officer_id.to_string(),
            },
        )
        .await
    }

    async fn verify_officer(&self, officer_id: &str) -> Result<(), ScanFailure> {
        self.post_envelope(
            "officer/verify",
            &VerifyOfficerRequest {
                officer_id: officer_id.to_string(),
            },
        )
        .await
    }

    async fn upload_signature(
        &self,
        order_id: OrderId,
        signature_png: &[u8],
    ) -> Result<(), ScanFailure> {
        self.post_envelope(
            &format!("order/{}/signature", order_id.0),
            &SignatureUploadRequest {
                order_id,
                signature_b64: STANDARD.encode(signature_png),
            },
        )
        .await
    }
}
