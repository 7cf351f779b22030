//! `tutorflow-pricing` — pure price derivation.
//!
//! No IO, no stored mutable state. Any persisted price is a cache of what
//! these functions return and must be recomputable from inputs.

pub mod price;

pub use price::{PriceBreakdown, final_price, promo_discount_amount};
