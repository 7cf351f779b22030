use serde::{Deserialize, Serialize};

use tutorflow_core::{BookingId, DomainError, DomainResult, EnrollmentId, Money};
use tutorflow_enrollment::{
    AccountDetails, EnrollmentSession, ProductDetails, PurchaseType, QuizData, ScheduleDetails,
    Step,
};

/// Storage key for the outgoing booking payload.
///
/// Written immediately *before* the tab navigates to the gateway; in-memory
/// state does not survive leaving the application.
pub const PENDING_BOOKING_KEY: &str = "tutorflow.pending_booking";

/// Storage key for the gateway access code returned at session creation.
pub const PAYMENT_ACCESS_CODE_KEY: &str = "tutorflow.payment_access_code";

/// The frozen booking snapshot handed to payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalBookingPayload {
    pub booking_id: BookingId,
    pub enrollment_id: EnrollmentId,
    pub purchase_type: PurchaseType,
    pub quiz_data: QuizData,
    pub account: AccountDetails,
    pub product: ProductDetails,
    pub schedule: ScheduleDetails,
    pub promo_code: Option<String>,
    /// Final discounted total due at the gateway.
    pub payment_amount: Money,
    /// Fixed discount + promo discount.
    pub applied_discount_amount: Money,
}

impl FinalBookingPayload {
    /// Freeze the booking from a completed wizard.
    ///
    /// Fails with a recoverable validation error when required derived data
    /// is missing (the payment step was reached without a computed amount).
    /// Callers route the user back to the schedule step instead of rendering
    /// a broken payment form.
    pub fn from_session(session: &EnrollmentSession, booking_id: BookingId) -> DomainResult<Self> {
        if session.step() != Step::Payment {
            return Err(DomainError::invariant(
                "a booking can only be finalized at the payment step",
            ));
        }

        let purchase_type = session
            .purchase_type()
            .ok_or_else(|| DomainError::validation("purchase type is not available"))?;
        let quiz_data = session
            .quiz_data()
            .cloned()
            .ok_or_else(|| DomainError::validation("intake data is not available"))?;
        let account = session
            .account()
            .cloned()
            .ok_or_else(|| DomainError::validation("account details are incomplete"))?;
        let product = session
            .product()
            .cloned()
            .ok_or_else(|| DomainError::validation("payment amount is not available"))?;
        let schedule = session
            .schedule()
            .cloned()
            .ok_or_else(|| DomainError::validation("schedule details are incomplete"))?;
        let breakdown = session
            .price_breakdown()
            .ok_or_else(|| DomainError::validation("payment amount is not available"))?;

        Ok(Self {
            booking_id,
            enrollment_id: session.id_typed(),
            purchase_type,
            quiz_data,
            account,
            product,
            schedule,
            promo_code: session.promo().code.clone(),
            payment_amount: breakdown.final_price,
            applied_discount_amount: breakdown.applied_discount,
        })
    }
}
