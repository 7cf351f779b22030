use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tutorflow_core::Money;
use tutorflow_pricing::promo_discount_amount;

/// Normalize a raw promo code: trim whitespace, uppercase.
///
/// Returns `None` for empty input so callers reject it before any remote call.
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Applied-promo state carried on an enrollment.
///
/// `discount_amount` is a cache of `original_price * discount_percentage / 100`
/// (rounded to a minor unit). It must be recomputed from the percentage and
/// the current base price on every restore, never replayed from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCodeData {
    pub code: Option<String>,
    pub discount_percentage: f64,
    pub discount_amount: Money,
    /// Base price snapshot at time of application.
    pub original_price: Money,
}

impl PromoCodeData {
    /// The null/zero state: no code applied, no discount.
    ///
    /// Removing a promo is an unconditional reset to this state, regardless
    /// of what was applied before.
    pub fn none() -> Self {
        Self {
            code: None,
            discount_percentage: 0.0,
            discount_amount: Money::ZERO,
            original_price: Money::ZERO,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.code.is_some()
    }

    /// A freshly applied promo, with the discount amount derived from the
    /// percentage against `base_price`.
    pub fn applied(code: String, discount_percentage: f64, base_price: Money) -> Self {
        Self {
            code: Some(code),
            discount_percentage,
            discount_amount: promo_discount_amount(base_price, discount_percentage),
            original_price: base_price,
        }
    }

    /// The same promo re-derived against the current base price.
    ///
    /// This is the restore path: stored percentage in, fresh amount out.
    pub fn recomputed(&self, base_price: Money) -> Self {
        match &self.code {
            Some(code) => Self::applied(code.clone(), self.discount_percentage, base_price),
            None => Self::none(),
        }
    }
}

impl Default for PromoCodeData {
    fn default() -> Self {
        Self::none()
    }
}

/// Successful remote validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoValidation {
    pub discount_percentage: f64,
    pub message: Option<String>,
}

/// Remote validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromoServiceError {
    /// The service rejected the code with a user-facing message.
    #[error("{message}")]
    Rejected { message: String },

    #[error("promo validation request failed: {0}")]
    Network(String),

    #[error("promo validation response malformed: {0}")]
    Parse(String),
}

impl PromoServiceError {
    /// Message suitable for direct display: the remote text when available,
    /// a generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::Network(_) | Self::Parse(_) => {
                "We could not validate that promo code. Please try again.".to_string()
            }
        }
    }
}

/// Remote promo validation endpoint.
#[async_trait]
pub trait PromoService: Send + Sync {
    async fn validate(&self, code: &str) -> Result<PromoValidation, PromoServiceError>;
}

/// Result of an apply attempt that reached a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Code accepted: the new promo state, plus any service message.
    Applied {
        promo: PromoCodeData,
        message: Option<String>,
    },
    /// The code equals the currently applied one. No network call was made
    /// and the stored state is unchanged.
    AlreadyApplied,
}

/// Apply failure.
///
/// On `Rejected`, any previously applied promo must be fully cleared by the
/// caller (store `PromoCodeData::none()`) - a failed validation never leaves
/// the prior promo active.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("enter a promo code first")]
    EmptyCode,

    #[error("{message}")]
    Rejected { message: String },
}

/// Validate a raw code against the remote service and build the new promo
/// state.
///
/// Normalizes first, rejects empty input locally, and short-circuits when the
/// code is already applied so no redundant network call is made.
pub async fn validate_and_apply(
    service: &dyn PromoService,
    current: &PromoCodeData,
    raw_code: &str,
    base_price: Money,
) -> Result<ApplyOutcome, ApplyError> {
    let code = normalize_code(raw_code).ok_or(ApplyError::EmptyCode)?;

    if current.code.as_deref() == Some(code.as_str()) {
        return Ok(ApplyOutcome::AlreadyApplied);
    }

    match service.validate(&code).await {
        Ok(validation) => Ok(ApplyOutcome::Applied {
            promo: PromoCodeData::applied(code, validation.discount_percentage, base_price),
            message: validation.message,
        }),
        Err(err) => {
            tracing::warn!(code = %code, error = %err, "promo validation failed");
            Err(ApplyError::Rejected {
                message: err.user_message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubService {
        calls: AtomicUsize,
        response: Result<PromoValidation, PromoServiceError>,
    }

    impl StubService {
        fn ok(discount_percentage: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(PromoValidation {
                    discount_percentage,
                    message: Some("Promo applied".to_string()),
                }),
            }
        }

        fn failing(err: PromoServiceError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(err),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PromoService for StubService {
        async fn validate(&self, _code: &str) -> Result<PromoValidation, PromoServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    #[test]
    fn normalization_trims_and_uppercases() {
        assert_eq!(normalize_code("  save10 "), Some("SAVE10".to_string()));
        assert_eq!(normalize_code("   "), None);
        assert_eq!(normalize_code(""), None);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_a_network_call() {
        let service = StubService::ok(10.0);
        let err = validate_and_apply(&service, &PromoCodeData::none(), "  ", Money::from_major(120))
            .await
            .unwrap_err();
        assert_eq!(err, ApplyError::EmptyCode);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn successful_validation_derives_amount_from_percentage() {
        let service = StubService::ok(10.0);
        let outcome = validate_and_apply(
            &service,
            &PromoCodeData::none(),
            "save10",
            Money::from_major(120),
        )
        .await
        .unwrap();

        match outcome {
            ApplyOutcome::Applied { promo, .. } => {
                assert_eq!(promo.code.as_deref(), Some("SAVE10"));
                assert_eq!(promo.discount_amount, Money::from_major(12));
                assert_eq!(promo.original_price, Money::from_major(120));
            }
            other => panic!("expected Applied, got {other:?}"),
        }
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn reapplying_the_same_code_short_circuits() {
        let service = StubService::ok(10.0);
        let current = PromoCodeData::applied("SAVE10".to_string(), 10.0, Money::from_major(120));

        let outcome = validate_and_apply(&service, &current, " save10 ", Money::from_major(120))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn rejection_carries_the_remote_message() {
        let service = StubService::failing(PromoServiceError::Rejected {
            message: "This code has expired".to_string(),
        });
        let current = PromoCodeData::applied("OLD5".to_string(), 5.0, Money::from_major(120));

        let err = validate_and_apply(&service, &current, "expired1", Money::from_major(120))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApplyError::Rejected {
                message: "This code has expired".to_string()
            }
        );
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_a_generic_message() {
        let service = StubService::failing(PromoServiceError::Network("timeout".to_string()));
        let err = validate_and_apply(
            &service,
            &PromoCodeData::none(),
            "save10",
            Money::from_major(120),
        )
        .await
        .unwrap_err();

        match err {
            ApplyError::Rejected { message } => assert!(message.contains("could not validate")),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn recompute_uses_current_base_price() {
        let promo = PromoCodeData::applied("SAVE10".to_string(), 10.0, Money::from_major(120));
        let rederived = promo.recomputed(Money::from_major(200));
        assert_eq!(rederived.discount_amount, Money::from_major(20));
        assert_eq!(rederived.original_price, Money::from_major(200));

        // The null state stays null.
        assert_eq!(
            PromoCodeData::none().recomputed(Money::from_major(200)),
            PromoCodeData::none()
        );
    }
}
