use async_trait::async_trait;
use serde::Deserialize;

use tutorflow_promo::{PromoService, PromoServiceError, PromoValidation};

/// Client for the promo validation endpoint (`POST {api}/promo/validate`).
pub struct HttpPromoService {
    api_url: String,
    client: reqwest::Client,
}

impl HttpPromoService {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    discount_percentage: f64,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

#[async_trait]
impl PromoService for HttpPromoService {
    async fn validate(&self, code: &str) -> Result<PromoValidation, PromoServiceError> {
        let url = format!("{}/promo/validate", self.api_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| PromoServiceError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_client_error() {
            // Rejection with a user-facing message when the API provides one.
            let message = resp
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "That promo code is not valid.".to_string());
            return Err(PromoServiceError::Rejected { message });
        }
        if !status.is_success() {
            return Err(PromoServiceError::Network(format!(
                "promo validation returned {status}"
            )));
        }

        let body: ValidateResponse = resp
            .json()
            .await
            .map_err(|e| PromoServiceError::Parse(e.to_string()))?;

        Ok(PromoValidation {
            discount_percentage: body.discount_percentage,
            message: body.message,
        })
    }
}
