use thiserror::Error;

use tutorflow_auth::IdentityError;
use tutorflow_core::DomainError;
use tutorflow_enrollment::Step;
use tutorflow_infra::StoreError;

use crate::controller::Operation;

/// Flow-level error.
///
/// Nothing here is fatal to the process: every variant maps to an inline
/// message, a guided path to another step, or a reset to fresh input.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A transition or input was rejected by the domain.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("failed to encode enrollment state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Another request for the same operation is still in flight.
    #[error("{0:?} is already in progress")]
    OperationInFlight(Operation),

    /// The flow was torn down or superseded while a request was in flight;
    /// the response was discarded.
    #[error("the flow was superseded while a request was in flight")]
    Superseded,

    /// Promo validation failed. Any previously applied promo has been
    /// cleared.
    #[error("{message}")]
    PromoRejected { message: String },

    /// Payment-session creation failed. The payment storage keys were rolled
    /// back and no navigation happened.
    #[error("{message}")]
    PaymentInitiation { message: String },

    /// The finalized booking is missing required fields. Render a recovery
    /// prompt guiding the user back to `return_to` instead of a broken
    /// payment form.
    #[error("booking is incomplete: {reason}")]
    IncompleteBooking { reason: String, return_to: Step },
}
