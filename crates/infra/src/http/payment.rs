use async_trait::async_trait;
use serde::Deserialize;

use tutorflow_payment::{FinalBookingPayload, GatewayError, PaymentGateway, PaymentSession};

/// Client for the payment-session creation endpoint
/// (`POST {api}/initiate-payment`).
pub struct HttpPaymentGateway {
    api_url: String,
    client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateResponse {
    success: bool,
    redirect_url: Option<String>,
    access_code: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment_session(
        &self,
        payload: &FinalBookingPayload,
        token: &str,
    ) -> Result<PaymentSession, GatewayError> {
        let url = format!("{}/initiate-payment", self.api_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            let message = resp
                .json::<InitiateResponse>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(GatewayError::Declined { message });
        }
        if !status.is_success() {
            return Err(GatewayError::Network(format!(
                "payment session creation returned {status}"
            )));
        }

        let body: InitiateResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        if !body.success {
            return Err(GatewayError::Declined {
                message: body.message,
            });
        }

        let redirect_url = body
            .redirect_url
            .ok_or_else(|| GatewayError::Parse("missing redirectUrl".to_string()))?;
        let access_code = body
            .access_code
            .ok_or_else(|| GatewayError::Parse("missing accessCode".to_string()))?;

        Ok(PaymentSession {
            redirect_url,
            access_code,
        })
    }
}
