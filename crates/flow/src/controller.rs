use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use tutorflow_auth::IdentityProvider;
use tutorflow_core::{Aggregate, BookingId, DomainError, EnrollmentId};
use tutorflow_enrollment::{
    ApplyPromo, ContactDetails, ENROLLMENT_SESSION_KEY, EnrollmentCommand, EnrollmentSession,
    EnrollmentSnapshot, PurchaseType, QuizData, RemovePromo, ReturnToAccount, StartEnrollment,
    Step, SubmitAccount, SubmitSchedule,
};
use tutorflow_events::{Command, Event};
use tutorflow_payment::{
    FinalBookingPayload, PAYMENT_ACCESS_CODE_KEY, PENDING_BOOKING_KEY, PaymentGateway,
};
use tutorflow_promo::{ApplyError, ApplyOutcome, PromoCodeData, PromoService, validate_and_apply};

use tutorflow_infra::SessionStore;

use crate::error::FlowError;
use crate::query::{PAYMENT_STATUS_ROUTE, QueryParams};

/// Remote operations that must not run twice concurrently.
///
/// A double-clicked "Apply" or "Pay" is the flow's only concurrency hazard:
/// the triggering control is disabled while its operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ApplyPromo,
    InitiatePayment,
}

/// In-flight bookkeeping: one request per operation at a time, plus a
/// generation counter that invalidates responses arriving after the flow was
/// torn down or superseded.
#[derive(Debug, Default)]
struct OpTracker {
    in_flight: Option<Operation>,
    generation: u64,
}

impl OpTracker {
    fn begin(&mut self, op: Operation) -> Result<u64, FlowError> {
        if let Some(current) = self.in_flight {
            return Err(FlowError::OperationInFlight(current));
        }
        self.in_flight = Some(op);
        Ok(self.generation)
    }

    fn finish(&mut self, op: Operation) {
        if self.in_flight == Some(op) {
            self.in_flight = None;
        }
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight = None;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// What the UI should do after mounting the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// This load is the return trip from the payment gateway: redirect to
    /// the status-resolution route instead of resuming the wizard.
    RedirectToStatus { url: String },
    /// The wizard is ready (fresh or restored) at `step`.
    Ready { step: Step },
}

/// Result of an apply-promo attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromoOutcome {
    Applied {
        promo: PromoCodeData,
        message: Option<String>,
    },
    /// The code is already applied; nothing changed and no request was made.
    AlreadyApplied,
    /// The flow was superseded while the request was in flight; the response
    /// was discarded.
    Stale,
}

/// Full-page navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
}

/// Account-step prefill derived from the identity profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefill {
    pub contact: ContactDetails,
    /// Prefill the guardian fields when true, the student fields otherwise.
    pub is_parent: bool,
}

/// Raw schedule-step input from the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleInput {
    pub start_date: NaiveDate,
    pub weekday_slot: Option<NaiveTime>,
    pub weekend_slot: Option<NaiveTime>,
    pub postcode: String,
}

/// The wizard controller.
///
/// Holds the enrollment aggregate and its injected seams. Every accepted
/// command is followed by a persist of the complete snapshot record
/// (read-modify-write of the single stored key), so the flow survives
/// reloads and the payment redirect round trip.
pub struct FlowController<S, P, G, I> {
    session: EnrollmentSession,
    store: S,
    promo_service: P,
    gateway: G,
    identity: I,
    booking_id: BookingId,
    ops: OpTracker,
}

impl<S, P, G, I> FlowController<S, P, G, I>
where
    S: SessionStore,
    P: PromoService,
    G: PaymentGateway,
    I: IdentityProvider,
{
    /// Mount the flow.
    ///
    /// Detects the gateway return trip, restores persisted state (malformed
    /// records are discarded and the flow starts fresh), and applies a `step`
    /// query override to the restored step.
    #[allow(clippy::too_many_arguments)]
    pub fn mount(
        store: S,
        promo_service: P,
        gateway: G,
        identity: I,
        purchase_type: PurchaseType,
        quiz_data: QuizData,
        query: &QueryParams,
        now: DateTime<Utc>,
    ) -> Result<(Self, MountOutcome), FlowError> {
        let controller = Self::restore_or_start(
            store,
            promo_service,
            gateway,
            identity,
            purchase_type,
            quiz_data,
            query.step_override(),
            now,
        )?;

        if query.is_payment_return() {
            // Outcome determination belongs to the status route, not step 3.
            return Ok((
                controller,
                MountOutcome::RedirectToStatus {
                    url: PAYMENT_STATUS_ROUTE.to_string(),
                },
            ));
        }

        let step = controller.session.step();
        Ok((controller, MountOutcome::Ready { step }))
    }

    #[allow(clippy::too_many_arguments)]
    fn restore_or_start(
        store: S,
        promo_service: P,
        gateway: G,
        identity: I,
        purchase_type: PurchaseType,
        quiz_data: QuizData,
        step_override: Option<Step>,
        now: DateTime<Utc>,
    ) -> Result<Self, FlowError> {
        let session = match Self::read_snapshot(&store) {
            Some(snapshot) => snapshot.restore(step_override),
            None => {
                let enrollment_id = EnrollmentId::new();
                let mut session = EnrollmentSession::empty(enrollment_id);
                let command = EnrollmentCommand::StartEnrollment(StartEnrollment {
                    enrollment_id,
                    purchase_type,
                    quiz_data,
                    occurred_at: now,
                });
                let events = session.handle(&command)?;
                for event in &events {
                    session.apply(event);
                }
                session
            }
        };

        let controller = Self {
            session,
            store,
            promo_service,
            gateway,
            identity,
            booking_id: BookingId::new(),
            ops: OpTracker::default(),
        };

        // Write the canonical (re-derived) record straight back.
        controller.persist()?;
        Ok(controller)
    }

    fn read_snapshot(store: &S) -> Option<EnrollmentSnapshot> {
        match store.get(ENROLLMENT_SESSION_KEY) {
            Ok(Some(raw)) => EnrollmentSnapshot::parse(&raw),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "session store read failed; starting fresh");
                None
            }
        }
    }

    pub fn session(&self) -> &EnrollmentSession {
        &self.session
    }

    pub fn step(&self) -> Step {
        self.session.step()
    }

    /// Account-step prefill from the signed-in profile, when known.
    pub fn prefill(&self) -> Option<Prefill> {
        self.identity.profile().map(|profile| Prefill {
            contact: ContactDetails {
                first_name: profile.first_name,
                last_name: profile.last_name,
                email: profile.email,
                phone: profile.phone,
            },
            is_parent: profile.is_parent,
        })
    }

    /// Step 1 → 2.
    pub fn submit_account(
        &mut self,
        student: ContactDetails,
        guardian: ContactDetails,
        now: DateTime<Utc>,
    ) -> Result<Step, FlowError> {
        self.dispatch(EnrollmentCommand::SubmitAccount(SubmitAccount {
            enrollment_id: self.session.id_typed(),
            student,
            guardian,
            occurred_at: now,
        }))?;
        self.persist()?;
        Ok(self.session.step())
    }

    /// Step 2 → 3.
    pub fn submit_schedule(
        &mut self,
        input: ScheduleInput,
        now: DateTime<Utc>,
    ) -> Result<Step, FlowError> {
        self.dispatch(EnrollmentCommand::SubmitSchedule(SubmitSchedule {
            enrollment_id: self.session.id_typed(),
            start_date: input.start_date,
            weekday_slot: input.weekday_slot,
            weekend_slot: input.weekend_slot,
            postcode: input.postcode,
            occurred_at: now,
        }))?;
        self.persist()?;
        Ok(self.session.step())
    }

    /// Step 2 → 1, keeping everything entered so far.
    pub fn back(&mut self, now: DateTime<Utc>) -> Result<Step, FlowError> {
        self.dispatch(EnrollmentCommand::ReturnToAccount(ReturnToAccount {
            enrollment_id: self.session.id_typed(),
            occurred_at: now,
        }))?;
        self.persist()?;
        Ok(self.session.step())
    }

    /// Validate and apply a promo code.
    ///
    /// Rejects empty input locally, short-circuits when the code is already
    /// applied, and on remote failure clears any previously applied promo
    /// before surfacing the message.
    pub async fn apply_promo(
        &mut self,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<PromoOutcome, FlowError> {
        let generation = self.ops.begin(Operation::ApplyPromo)?;

        let base_price = match self.session.product() {
            Some(product) => product.base_price,
            None => {
                self.ops.finish(Operation::ApplyPromo);
                return Err(DomainError::invariant("no product derived for this enrollment").into());
            }
        };

        let result =
            validate_and_apply(&self.promo_service, self.session.promo(), raw_code, base_price)
                .await;

        self.ops.finish(Operation::ApplyPromo);
        if !self.ops.is_current(generation) {
            return Ok(PromoOutcome::Stale);
        }

        match result {
            Ok(ApplyOutcome::AlreadyApplied) => Ok(PromoOutcome::AlreadyApplied),
            Ok(ApplyOutcome::Applied { promo, message }) => {
                self.dispatch(EnrollmentCommand::ApplyPromo(ApplyPromo {
                    enrollment_id: self.session.id_typed(),
                    promo,
                    occurred_at: now,
                }))?;
                self.persist()?;
                Ok(PromoOutcome::Applied {
                    promo: self.session.promo().clone(),
                    message,
                })
            }
            Err(ApplyError::EmptyCode) => {
                Err(DomainError::validation("enter a promo code first").into())
            }
            Err(ApplyError::Rejected { message }) => {
                // A failed validation never leaves the previous promo active.
                self.dispatch(EnrollmentCommand::RemovePromo(RemovePromo {
                    enrollment_id: self.session.id_typed(),
                    occurred_at: now,
                }))?;
                self.persist()?;
                Err(FlowError::PromoRejected { message })
            }
        }
    }

    /// Unconditionally remove any applied promo.
    pub fn remove_promo(&mut self, now: DateTime<Utc>) -> Result<(), FlowError> {
        self.dispatch(EnrollmentCommand::RemovePromo(RemovePromo {
            enrollment_id: self.session.id_typed(),
            occurred_at: now,
        }))?;
        self.persist()?;
        Ok(())
    }

    /// The finalized booking the payment step renders.
    ///
    /// When required derived data is missing (e.g. step 3 was reached without
    /// a computed payment amount), this is a recoverable error guiding the
    /// user back to the schedule step - never a crash or an undefined amount.
    pub fn payment_view(&self) -> Result<FinalBookingPayload, FlowError> {
        FinalBookingPayload::from_session(&self.session, self.booking_id).map_err(|err| {
            FlowError::IncompleteBooking {
                reason: err.to_string(),
                return_to: Step::Schedule,
            }
        })
    }

    /// Create the gateway session and hand the browser off to it.
    ///
    /// The payload is persisted *before* any navigation can happen; on
    /// failure both payment keys and the in-progress record are cleared and
    /// the error is surfaced without navigating.
    pub async fn initiate_payment(&mut self) -> Result<Redirect, FlowError> {
        let generation = self.ops.begin(Operation::InitiatePayment)?;
        let outcome = self.do_initiate_payment(generation).await;
        self.ops.finish(Operation::InitiatePayment);
        outcome
    }

    async fn do_initiate_payment(&mut self, generation: u64) -> Result<Redirect, FlowError> {
        let payload = self.payment_view()?;
        let payload_json = serde_json::to_string(&payload)?;

        // The tab is about to leave the application; in-memory state will
        // not survive the redirect.
        self.store.set(PENDING_BOOKING_KEY, &payload_json)?;

        let token = match self.identity.bearer_token() {
            Ok(token) => token,
            Err(err) => {
                self.rollback_payment_keys();
                return Err(err.into());
            }
        };

        let result = self.gateway.create_payment_session(&payload, &token).await;

        if !self.ops.is_current(generation) {
            self.rollback_payment_keys();
            return Err(FlowError::Superseded);
        }

        match result {
            Ok(payment_session) => {
                self.store
                    .set(PAYMENT_ACCESS_CODE_KEY, &payment_session.access_code)?;
                tracing::info!(
                    booking = %payload.booking_id,
                    amount = %payload.payment_amount,
                    "payment session created, redirecting"
                );
                Ok(Redirect {
                    url: payment_session.redirect_url,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "payment session creation failed");
                // No orphaned partial state: drop what was just written and
                // the in-progress record. The flow restarts from step 1.
                self.rollback_payment_keys();
                if let Err(store_err) = self.store.remove(ENROLLMENT_SESSION_KEY) {
                    tracing::error!(error = %store_err, "failed to clear enrollment record");
                }
                Err(FlowError::PaymentInitiation {
                    message: err.user_message(),
                })
            }
        }
    }

    fn rollback_payment_keys(&self) {
        for key in [PENDING_BOOKING_KEY, PAYMENT_ACCESS_CODE_KEY] {
            if let Err(err) = self.store.remove(key) {
                tracing::error!(key, error = %err, "failed to roll back payment storage key");
            }
        }
    }

    /// Tear the flow down. In-flight responses arriving after this are
    /// discarded.
    pub fn teardown(&mut self) {
        self.ops.bump();
    }

    /// Clear every stored key for this flow.
    ///
    /// Success-path cleanup is owned by the status-resolution collaborator;
    /// this is the seam it calls.
    pub fn clear_session(&self) -> Result<(), FlowError> {
        self.store.remove(ENROLLMENT_SESSION_KEY)?;
        self.store.remove(PENDING_BOOKING_KEY)?;
        self.store.remove(PAYMENT_ACCESS_CODE_KEY)?;
        Ok(())
    }

    fn dispatch(&mut self, command: EnrollmentCommand) -> Result<(), DomainError> {
        let events = self.session.handle(&command)?;
        for event in &events {
            tracing::debug!(
                event = event.event_type(),
                enrollment = %command.target_enrollment_id(),
                "applying enrollment event"
            );
            self.session.apply(event);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), FlowError> {
        let snapshot = EnrollmentSnapshot::capture(&self.session)?;
        self.store.set(ENROLLMENT_SESSION_KEY, &snapshot.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_second_request_for_the_same_operation_is_refused() {
        let mut ops = OpTracker::default();
        ops.begin(Operation::ApplyPromo).unwrap();
        let err = ops.begin(Operation::ApplyPromo).unwrap_err();
        assert!(matches!(
            err,
            FlowError::OperationInFlight(Operation::ApplyPromo)
        ));
    }

    #[test]
    fn finish_releases_the_operation() {
        let mut ops = OpTracker::default();
        ops.begin(Operation::InitiatePayment).unwrap();
        ops.finish(Operation::InitiatePayment);
        ops.begin(Operation::InitiatePayment).unwrap();
    }

    #[test]
    fn bump_invalidates_earlier_generations() {
        let mut ops = OpTracker::default();
        let generation = ops.begin(Operation::ApplyPromo).unwrap();
        assert!(ops.is_current(generation));
        ops.bump();
        assert!(!ops.is_current(generation));
        // Teardown also clears the in-flight marker.
        ops.begin(Operation::ApplyPromo).unwrap();
    }
}
