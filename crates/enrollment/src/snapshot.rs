use serde::{Deserialize, Serialize};

use tutorflow_core::{AggregateRoot, DomainError, DomainResult, EnrollmentId};
use tutorflow_promo::PromoCodeData;
use tutorflow_scheduling::{REST_DAY, generate_session_dates};

use crate::contact::AccountDetails;
use crate::product::{PurchaseType, QuizData, derive_product_details};
use crate::session::{EnrollmentSession, ScheduleDetails, Step};

/// Well-known storage key for the in-progress enrollment record.
///
/// A single key holds the whole record; updates are read-modify-write of the
/// complete snapshot, never a partial overwrite of one field.
pub const ENROLLMENT_SESSION_KEY: &str = "tutorflow.enrollment_session";

/// The persisted enrollment record.
///
/// Written after every step transition and every promo change so the flow
/// survives full-page reloads and the out-and-back payment redirect. Derived
/// fields (product, promo amount, session dates) are stored for inspection
/// but re-derived on restore - storage is a cache, not ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSnapshot {
    pub enrollment_id: EnrollmentId,
    pub step: Step,
    pub purchase_type: PurchaseType,
    pub quiz_data: QuizData,
    pub account: Option<AccountDetails>,
    pub schedule: Option<ScheduleDetails>,
    pub promo: PromoCodeData,
    pub version: u64,
}

impl EnrollmentSnapshot {
    /// Capture the complete current state for persistence.
    pub fn capture(session: &EnrollmentSession) -> DomainResult<Self> {
        if !session.is_created() {
            return Err(DomainError::not_found());
        }
        let purchase_type = session
            .purchase_type()
            .ok_or_else(|| DomainError::invariant("created enrollment without purchase type"))?;
        let quiz_data = session
            .quiz_data()
            .cloned()
            .ok_or_else(|| DomainError::invariant("created enrollment without quiz data"))?;

        Ok(Self {
            enrollment_id: session.id_typed(),
            step: session.step(),
            purchase_type,
            quiz_data,
            account: session.account().cloned(),
            schedule: session.schedule().cloned(),
            promo: session.promo().clone(),
            version: session.version(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored record.
    ///
    /// Malformed data is treated as absent: the corrupted record is discarded
    /// (logged, not surfaced) and the flow starts fresh.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "discarding corrupt enrollment snapshot");
                None
            }
        }
    }

    /// Rebuild the aggregate from this record.
    ///
    /// All derived state goes back through the live-path derivations: the
    /// product from quiz data + purchase type, the promo amount from the
    /// percentage against the recomputed base price, and the session-date
    /// list from the scheduler. A `step` query parameter overrides the
    /// persisted step (deep links back from an external redirect).
    pub fn restore(self, step_override: Option<Step>) -> EnrollmentSession {
        let product = derive_product_details(&self.quiz_data, self.purchase_type);
        let promo = self.promo.recomputed(product.base_price);
        let schedule = self.schedule.map(|stored| ScheduleDetails {
            session_dates: generate_session_dates(
                stored.start_date,
                product.session_count as usize,
                REST_DAY,
            ),
            ..stored
        });

        EnrollmentSession::assemble(
            self.enrollment_id,
            step_override.unwrap_or(self.step),
            self.purchase_type,
            self.quiz_data,
            product,
            self.account,
            schedule,
            promo,
            self.version,
        )
    }
}
