//! `tutorflow-payment` — the handoff to the external payment redirect.

pub mod gateway;
pub mod payload;

pub use gateway::{GatewayError, PaymentGateway, PaymentSession};
pub use payload::{
    FinalBookingPayload, PAYMENT_ACCESS_CODE_KEY, PENDING_BOOKING_KEY,
};
