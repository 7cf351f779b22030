use async_trait::async_trait;
use thiserror::Error;

use crate::payload::FinalBookingPayload;

/// A created gateway session: where to send the browser, plus the access
/// code used to reconcile the outcome after the return trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub redirect_url: String,
    pub access_code: String,
}

/// Payment-session creation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway refused to create a session.
    #[error("{}", message.as_deref().unwrap_or("payment could not be started"))]
    Declined { message: Option<String> },

    #[error("payment session request failed: {0}")]
    Network(String),

    #[error("payment session response malformed: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Message suitable for direct display: the remote text when available,
    /// a generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined {
                message: Some(message),
            } => message.clone(),
            _ => "We could not start your payment. Please try again.".to_string(),
        }
    }
}

/// Remote payment-session creation endpoint.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_session(
        &self,
        payload: &FinalBookingPayload,
        token: &str,
    ) -> Result<PaymentSession, GatewayError>;
}
