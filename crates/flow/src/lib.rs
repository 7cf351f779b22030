//! `tutorflow-flow` — the enrollment wizard controller.
//!
//! Wires the enrollment aggregate to its seams (session store, promo
//! validation, payment gateway, identity) and owns the concerns the pure
//! domain cannot: restore-on-mount, persistence after every transition,
//! in-flight request guarding, and the payment redirect choreography.

pub mod controller;
pub mod error;
pub mod query;


pub use controller::{
    FlowController, MountOutcome, Operation, Prefill, PromoOutcome, Redirect, ScheduleInput,
};
pub use error::FlowError;
pub use query::{PAYMENT_STATUS_ROUTE, QueryParams};
