//! `tutorflow-promo` — promo code state and validation orchestration.

pub mod code;

pub use code::{
    ApplyError, ApplyOutcome, PromoCodeData, PromoService, PromoServiceError, PromoValidation,
    normalize_code, validate_and_apply,
};
