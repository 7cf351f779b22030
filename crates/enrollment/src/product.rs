use serde::{Deserialize, Serialize};

use tutorflow_core::Money;

/// Package being purchased. Set once at flow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    Trial,
    StarterPack,
}

impl PurchaseType {
    pub fn session_count(&self) -> u32 {
        match self {
            PurchaseType::Trial => 1,
            PurchaseType::StarterPack => 6,
        }
    }
}

/// Intake data supplied upstream of the flow (quiz funnel).
///
/// Treated as opaque input except for the named fields the flow consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizData {
    pub subject: String,
    /// School year label, e.g. "Year 9".
    pub year: String,
    pub contact_email: Option<String>,
    pub is_parent: bool,
    /// Price per session.
    pub session_price: Money,
    /// Flat starter-pack incentive, removed before any promo is applied.
    pub starter_discount: Money,
}

/// Product description derived from intake data + purchase type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub base_price: Money,
    pub per_session_price: Money,
    pub session_count: u32,
    /// Flat discount removed before any promo percentage applies.
    pub fixed_discount: Money,
}

/// Derive the product for an enrollment.
///
/// Single code path: the fresh-entry path and the restore-from-storage path
/// both call this, so a persisted copy is only ever a cache.
pub fn derive_product_details(quiz: &QuizData, purchase_type: PurchaseType) -> ProductDetails {
    let session_count = purchase_type.session_count();
    let (name, fixed_discount) = match purchase_type {
        PurchaseType::Trial => (format!("{} trial session", quiz.subject), Money::ZERO),
        PurchaseType::StarterPack => (
            format!("{} starter pack ({session_count} sessions)", quiz.subject),
            quiz.starter_discount,
        ),
    };
    ProductDetails {
        name,
        base_price: quiz.session_price.times(session_count),
        per_session_price: quiz.session_price,
        session_count,
        fixed_discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> QuizData {
        QuizData {
            subject: "Maths".to_string(),
            year: "Year 9".to_string(),
            contact_email: Some("parent@example.com".to_string()),
            is_parent: true,
            session_price: Money::from_major(20),
            starter_discount: Money::from_major(5),
        }
    }

    #[test]
    fn trial_is_one_session_with_no_fixed_discount() {
        let product = derive_product_details(&quiz(), PurchaseType::Trial);
        assert_eq!(product.session_count, 1);
        assert_eq!(product.base_price, Money::from_major(20));
        assert_eq!(product.fixed_discount, Money::ZERO);
        assert_eq!(product.name, "Maths trial session");
    }

    #[test]
    fn starter_pack_is_six_sessions_with_the_incentive() {
        let product = derive_product_details(&quiz(), PurchaseType::StarterPack);
        assert_eq!(product.session_count, 6);
        assert_eq!(product.base_price, Money::from_major(120));
        assert_eq!(product.fixed_discount, Money::from_major(5));
        assert_eq!(product.per_session_price, Money::from_major(20));
    }
}
