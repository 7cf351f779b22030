use serde::{Deserialize, Serialize};

use tutorflow_core::Money;

/// Promo discount for a percentage code.
///
/// `base_price` is the product's base price, i.e. the price *before* the
/// fixed discount - not the already-discounted total. Applying the
/// percentage to the discounted total would compound the two discount types.
pub fn promo_discount_amount(base_price: Money, discount_percentage: f64) -> Money {
    base_price.percentage(discount_percentage)
}

/// Final amount due: `max(0, base - (fixed + promo))`.
///
/// The two discount terms are each already whole minor units when set; the
/// subtraction itself is exact and is not re-rounded.
pub fn final_price(base_price: Money, fixed_discount: Money, promo_discount: Money) -> Money {
    base_price.saturating_sub(fixed_discount + promo_discount)
}

/// Full price derivation for one enrollment.
///
/// This is the single code path for pricing: the live-edit path and the
/// restore-from-storage path both call it, so the two cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: Money,
    pub fixed_discount: Money,
    pub promo_discount: Money,
    /// `fixed_discount + promo_discount`.
    pub applied_discount: Money,
    /// Amount due at checkout.
    pub final_price: Money,
}

impl PriceBreakdown {
    /// Derive the breakdown from its inputs.
    ///
    /// The promo amount is always recomputed from the percentage against the
    /// current base price; a stored amount is never replayed as ground truth.
    pub fn derive(base_price: Money, fixed_discount: Money, promo_percentage: f64) -> Self {
        let promo_discount = promo_discount_amount(base_price, promo_percentage);
        Self {
            base_price,
            fixed_discount,
            promo_discount,
            applied_discount: fixed_discount + promo_discount,
            final_price: final_price(base_price, fixed_discount, promo_discount),
        }
    }
}
