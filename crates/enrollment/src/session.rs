use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use tutorflow_core::{Aggregate, AggregateRoot, DomainError, EnrollmentId};
use tutorflow_events::{Command, Event};
use tutorflow_pricing::PriceBreakdown;
use tutorflow_promo::PromoCodeData;
use tutorflow_scheduling::{REST_DAY, StartDateRange, TimeSlots, generate_session_dates};

use crate::contact::{AccountDetails, ContactDetails};
use crate::product::{ProductDetails, PurchaseType, QuizData, derive_product_details};

/// Wizard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Account,
    Schedule,
    Payment,
}

impl Step {
    /// 1-based step number as exposed in URLs.
    pub fn number(self) -> u8 {
        match self {
            Step::Account => 1,
            Step::Schedule => 2,
            Step::Payment => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::Account),
            2 => Some(Step::Schedule),
            3 => Some(Step::Payment),
            _ => None,
        }
    }
}

/// Step 2 output: when and where the sessions happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDetails {
    pub start_date: NaiveDate,
    /// Derived via the scheduler. Re-derived, not trusted, on restore.
    pub session_dates: Vec<NaiveDate>,
    pub slots: TimeSlots,
    pub postcode: String,
}

/// Aggregate root: one enrollment attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentSession {
    id: EnrollmentId,
    step: Step,
    purchase_type: Option<PurchaseType>,
    quiz_data: Option<QuizData>,
    product: Option<ProductDetails>,
    account: Option<AccountDetails>,
    schedule: Option<ScheduleDetails>,
    promo: PromoCodeData,
    version: u64,
    created: bool,
}

impl EnrollmentSession {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: EnrollmentId) -> Self {
        Self {
            id,
            step: Step::Account,
            purchase_type: None,
            quiz_data: None,
            product: None,
            account: None,
            schedule: None,
            promo: PromoCodeData::none(),
            version: 0,
            created: false,
        }
    }

    /// Assemble restored state. Callers must have re-derived `product`,
    /// `promo` and the schedule's session dates through the same pure
    /// functions the live path uses.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        id: EnrollmentId,
        step: Step,
        purchase_type: PurchaseType,
        quiz_data: QuizData,
        product: ProductDetails,
        account: Option<AccountDetails>,
        schedule: Option<ScheduleDetails>,
        promo: PromoCodeData,
        version: u64,
    ) -> Self {
        Self {
            id,
            step,
            purchase_type: Some(purchase_type),
            quiz_data: Some(quiz_data),
            product: Some(product),
            account,
            schedule,
            promo,
            version,
            created: true,
        }
    }

    pub fn id_typed(&self) -> EnrollmentId {
        self.id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn purchase_type(&self) -> Option<PurchaseType> {
        self.purchase_type
    }

    pub fn quiz_data(&self) -> Option<&QuizData> {
        self.quiz_data.as_ref()
    }

    pub fn product(&self) -> Option<&ProductDetails> {
        self.product.as_ref()
    }

    pub fn account(&self) -> Option<&AccountDetails> {
        self.account.as_ref()
    }

    pub fn schedule(&self) -> Option<&ScheduleDetails> {
        self.schedule.as_ref()
    }

    pub fn promo(&self) -> &PromoCodeData {
        &self.promo
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Current price derivation, when a product has been derived.
    ///
    /// Pure view over state: never stored, always recomputable.
    pub fn price_breakdown(&self) -> Option<PriceBreakdown> {
        self.product.as_ref().map(|product| {
            PriceBreakdown::derive(
                product.base_price,
                product.fixed_discount,
                self.promo.discount_percentage,
            )
        })
    }
}

impl AggregateRoot for EnrollmentSession {
    type Id = EnrollmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: StartEnrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartEnrollment {
    pub enrollment_id: EnrollmentId,
    pub purchase_type: PurchaseType,
    pub quiz_data: QuizData,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitAccount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAccount {
    pub enrollment_id: EnrollmentId,
    pub student: ContactDetails,
    pub guardian: ContactDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitSchedule.
///
/// Slot fields are optional at the input boundary; completeness per purchase
/// type is validated here, before the scheduler runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitSchedule {
    pub enrollment_id: EnrollmentId,
    pub start_date: NaiveDate,
    pub weekday_slot: Option<NaiveTime>,
    pub weekend_slot: Option<NaiveTime>,
    pub postcode: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReturnToAccount (the "back" action from step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnToAccount {
    pub enrollment_id: EnrollmentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApplyPromo. Carries remotely validated promo data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPromo {
    pub enrollment_id: EnrollmentId,
    pub promo: PromoCodeData,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemovePromo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovePromo {
    pub enrollment_id: EnrollmentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnrollmentCommand {
    StartEnrollment(StartEnrollment),
    SubmitAccount(SubmitAccount),
    SubmitSchedule(SubmitSchedule),
    ReturnToAccount(ReturnToAccount),
    ApplyPromo(ApplyPromo),
    RemovePromo(RemovePromo),
}

impl Command for EnrollmentCommand {
    fn target_enrollment_id(&self) -> EnrollmentId {
        match self {
            EnrollmentCommand::StartEnrollment(c) => c.enrollment_id,
            EnrollmentCommand::SubmitAccount(c) => c.enrollment_id,
            EnrollmentCommand::SubmitSchedule(c) => c.enrollment_id,
            EnrollmentCommand::ReturnToAccount(c) => c.enrollment_id,
            EnrollmentCommand::ApplyPromo(c) => c.enrollment_id,
            EnrollmentCommand::RemovePromo(c) => c.enrollment_id,
        }
    }
}

/// Event: EnrollmentStarted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentStarted {
    pub enrollment_id: EnrollmentId,
    pub purchase_type: PurchaseType,
    pub quiz_data: QuizData,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AccountSubmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSubmitted {
    pub enrollment_id: EnrollmentId,
    pub account: AccountDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ScheduleSubmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSubmitted {
    pub enrollment_id: EnrollmentId,
    pub schedule: ScheduleDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReturnedToAccount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnedToAccount {
    pub enrollment_id: EnrollmentId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PromoApplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoApplied {
    pub enrollment_id: EnrollmentId,
    pub promo: PromoCodeData,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PromoRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoRemoved {
    pub enrollment_id: EnrollmentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnrollmentEvent {
    EnrollmentStarted(EnrollmentStarted),
    AccountSubmitted(AccountSubmitted),
    ScheduleSubmitted(ScheduleSubmitted),
    ReturnedToAccount(ReturnedToAccount),
    PromoApplied(PromoApplied),
    PromoRemoved(PromoRemoved),
}

impl Event for EnrollmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EnrollmentEvent::EnrollmentStarted(_) => "enrollment.started",
            EnrollmentEvent::AccountSubmitted(_) => "enrollment.account.submitted",
            EnrollmentEvent::ScheduleSubmitted(_) => "enrollment.schedule.submitted",
            EnrollmentEvent::ReturnedToAccount(_) => "enrollment.returned_to_account",
            EnrollmentEvent::PromoApplied(_) => "enrollment.promo.applied",
            EnrollmentEvent::PromoRemoved(_) => "enrollment.promo.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EnrollmentEvent::EnrollmentStarted(e) => e.occurred_at,
            EnrollmentEvent::AccountSubmitted(e) => e.occurred_at,
            EnrollmentEvent::ScheduleSubmitted(e) => e.occurred_at,
            EnrollmentEvent::ReturnedToAccount(e) => e.occurred_at,
            EnrollmentEvent::PromoApplied(e) => e.occurred_at,
            EnrollmentEvent::PromoRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for EnrollmentSession {
    type Command = EnrollmentCommand;
    type Event = EnrollmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EnrollmentEvent::EnrollmentStarted(e) => {
                self.id = e.enrollment_id;
                self.step = Step::Account;
                self.purchase_type = Some(e.purchase_type);
                self.product = Some(derive_product_details(&e.quiz_data, e.purchase_type));
                self.quiz_data = Some(e.quiz_data.clone());
                self.account = None;
                self.schedule = None;
                self.promo = PromoCodeData::none();
                self.created = true;
            }
            EnrollmentEvent::AccountSubmitted(e) => {
                self.account = Some(e.account.clone());
                self.step = Step::Schedule;
            }
            EnrollmentEvent::ScheduleSubmitted(e) => {
                self.schedule = Some(e.schedule.clone());
                self.step = Step::Payment;
            }
            EnrollmentEvent::ReturnedToAccount(_) => {
                self.step = Step::Account;
            }
            EnrollmentEvent::PromoApplied(e) => {
                self.promo = e.promo.clone();
            }
            EnrollmentEvent::PromoRemoved(_) => {
                self.promo = PromoCodeData::none();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EnrollmentCommand::StartEnrollment(cmd) => self.handle_start(cmd),
            EnrollmentCommand::SubmitAccount(cmd) => self.handle_submit_account(cmd),
            EnrollmentCommand::SubmitSchedule(cmd) => self.handle_submit_schedule(cmd),
            EnrollmentCommand::ReturnToAccount(cmd) => self.handle_return_to_account(cmd),
            EnrollmentCommand::ApplyPromo(cmd) => self.handle_apply_promo(cmd),
            EnrollmentCommand::RemovePromo(cmd) => self.handle_remove_promo(cmd),
        }
    }
}

impl EnrollmentSession {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn handle_start(&self, cmd: &StartEnrollment) -> Result<Vec<EnrollmentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("enrollment already started"));
        }

        Ok(vec![EnrollmentEvent::EnrollmentStarted(EnrollmentStarted {
            enrollment_id: cmd.enrollment_id,
            purchase_type: cmd.purchase_type,
            quiz_data: cmd.quiz_data.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit_account(
        &self,
        cmd: &SubmitAccount,
    ) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_created()?;

        if self.step != Step::Account {
            return Err(DomainError::invariant(
                "account details can only be submitted from the account step",
            ));
        }

        let account = AccountDetails {
            student: cmd.student.clone(),
            guardian: cmd.guardian.clone(),
        };
        account.validate()?;

        Ok(vec![EnrollmentEvent::AccountSubmitted(AccountSubmitted {
            enrollment_id: cmd.enrollment_id,
            account,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit_schedule(
        &self,
        cmd: &SubmitSchedule,
    ) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_created()?;

        if self.step != Step::Schedule {
            return Err(DomainError::invariant(
                "a schedule can only be submitted from the schedule step",
            ));
        }

        let product = self
            .product
            .as_ref()
            .ok_or_else(|| DomainError::invariant("no product derived for this enrollment"))?;

        if cmd.postcode.trim().is_empty() {
            return Err(DomainError::validation("postcode is required"));
        }

        // Rest-day and range checks are owned here, not by the scheduler.
        if cmd.start_date.weekday() == REST_DAY {
            return Err(DomainError::validation(
                "sessions cannot start on the rest day",
            ));
        }

        let range = StartDateRange::from_today(cmd.occurred_at.date_naive());
        if !range.contains(cmd.start_date) {
            return Err(DomainError::validation(
                "start date must be after tomorrow and within one month",
            ));
        }

        let slots = match self.purchase_type {
            Some(PurchaseType::Trial) => {
                let time = cmd
                    .weekday_slot
                    .ok_or_else(|| DomainError::validation("select a session time"))?;
                TimeSlots::Single { time }
            }
            Some(PurchaseType::StarterPack) => {
                let weekday = cmd
                    .weekday_slot
                    .ok_or_else(|| DomainError::validation("select a weekday session time"))?;
                let weekend = cmd
                    .weekend_slot
                    .ok_or_else(|| DomainError::validation("select a weekend session time"))?;
                TimeSlots::Split { weekday, weekend }
            }
            None => return Err(DomainError::invariant("purchase type not set")),
        };

        let session_dates =
            generate_session_dates(cmd.start_date, product.session_count as usize, REST_DAY);

        Ok(vec![EnrollmentEvent::ScheduleSubmitted(ScheduleSubmitted {
            enrollment_id: cmd.enrollment_id,
            schedule: ScheduleDetails {
                start_date: cmd.start_date,
                session_dates,
                slots,
                postcode: cmd.postcode.trim().to_string(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_return_to_account(
        &self,
        cmd: &ReturnToAccount,
    ) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_created()?;

        if self.step != Step::Schedule {
            return Err(DomainError::invariant(
                "can only return to the account step from the schedule step",
            ));
        }

        Ok(vec![EnrollmentEvent::ReturnedToAccount(ReturnedToAccount {
            enrollment_id: cmd.enrollment_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_apply_promo(&self, cmd: &ApplyPromo) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_created()?;

        let product = self
            .product
            .as_ref()
            .ok_or_else(|| DomainError::invariant("no product derived for this enrollment"))?;

        // The discount amount is derived state: re-derive against the current
        // base price rather than storing whatever the caller computed.
        let promo = cmd.promo.recomputed(product.base_price);

        Ok(vec![EnrollmentEvent::PromoApplied(PromoApplied {
            enrollment_id: cmd.enrollment_id,
            promo,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_promo(&self, cmd: &RemovePromo) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_created()?;

        Ok(vec![EnrollmentEvent::PromoRemoved(PromoRemoved {
            enrollment_id: cmd.enrollment_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use tutorflow_core::Money;

    fn test_enrollment_id() -> EnrollmentId {
        EnrollmentId::new()
    }

    fn test_time() -> DateTime<Utc> {
        // Monday 2025-11-10.
        Utc.with_ymd_and_hms(2025, 11, 10, 9, 0, 0).unwrap()
    }

    fn quiz() -> QuizData {
        QuizData {
            subject: "Maths".to_string(),
            year: "Year 9".to_string(),
            contact_email: Some("sam@example.com".to_string()),
            is_parent: true,
            session_price: Money::from_major(20),
            starter_discount: Money::from_major(5),
        }
    }

    fn account_cmd(id: EnrollmentId) -> SubmitAccount {
        SubmitAccount {
            enrollment_id: id,
            student: ContactDetails {
                first_name: "Alex".to_string(),
                last_name: "Smith".to_string(),
                email: "alex@example.com".to_string(),
                phone: String::new(),
            },
            guardian: ContactDetails {
                first_name: "Sam".to_string(),
                last_name: "Smith".to_string(),
                email: "sam@example.com".to_string(),
                phone: "0400000000".to_string(),
            },
            occurred_at: test_time(),
        }
    }

    fn schedule_cmd(id: EnrollmentId) -> SubmitSchedule {
        SubmitSchedule {
            enrollment_id: id,
            // Saturday inside the selectable window for test_time().
            start_date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
            weekday_slot: NaiveTime::from_hms_opt(16, 0, 0),
            weekend_slot: NaiveTime::from_hms_opt(10, 30, 0),
            postcode: "2000".to_string(),
            occurred_at: test_time(),
        }
    }

    fn started(purchase_type: PurchaseType) -> EnrollmentSession {
        let id = test_enrollment_id();
        let mut session = EnrollmentSession::empty(id);
        let events = session
            .handle(&EnrollmentCommand::StartEnrollment(StartEnrollment {
                enrollment_id: id,
                purchase_type,
                quiz_data: quiz(),
                occurred_at: test_time(),
            }))
            .unwrap();
        session.apply(&events[0]);
        session
    }

    fn at_schedule_step(purchase_type: PurchaseType) -> EnrollmentSession {
        let mut session = started(purchase_type);
        let events = session
            .handle(&EnrollmentCommand::SubmitAccount(account_cmd(
                session.id_typed(),
            )))
            .unwrap();
        session.apply(&events[0]);
        session
    }

    #[test]
    fn start_derives_the_product() {
        let session = started(PurchaseType::StarterPack);
        let product = session.product().unwrap();
        assert_eq!(product.base_price, Money::from_major(120));
        assert_eq!(product.fixed_discount, Money::from_major(5));
        assert_eq!(session.step(), Step::Account);
        assert!(session.is_created());
    }

    #[test]
    fn cannot_start_twice() {
        let session = started(PurchaseType::Trial);
        let err = session
            .handle(&EnrollmentCommand::StartEnrollment(StartEnrollment {
                enrollment_id: session.id_typed(),
                purchase_type: PurchaseType::Trial,
                quiz_data: quiz(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn submit_account_moves_to_schedule_step() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        assert_eq!(session.step(), Step::Schedule);
        assert!(session.account().is_some());
    }

    #[test]
    fn submit_account_rejects_missing_guardian_phone() {
        let session = started(PurchaseType::StarterPack);
        let mut cmd = account_cmd(session.id_typed());
        cmd.guardian.phone = String::new();
        let err = session
            .handle(&EnrollmentCommand::SubmitAccount(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn submit_account_requires_the_account_step() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        let err = session
            .handle(&EnrollmentCommand::SubmitAccount(account_cmd(
                session.id_typed(),
            )))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn submit_schedule_computes_dates_skipping_the_rest_day() {
        let mut session = at_schedule_step(PurchaseType::StarterPack);
        let events = session
            .handle(&EnrollmentCommand::SubmitSchedule(schedule_cmd(
                session.id_typed(),
            )))
            .unwrap();
        session.apply(&events[0]);

        assert_eq!(session.step(), Step::Payment);
        let schedule = session.schedule().unwrap();
        assert_eq!(schedule.session_dates.len(), 6);
        // 2025-11-16 is a Sunday and must be skipped.
        assert!(
            !schedule
                .session_dates
                .contains(&NaiveDate::from_ymd_opt(2025, 11, 16).unwrap())
        );
        assert_eq!(
            schedule.session_dates[0],
            NaiveDate::from_ymd_opt(2025, 11, 15).unwrap()
        );
        assert_eq!(
            schedule.session_dates[1],
            NaiveDate::from_ymd_opt(2025, 11, 17).unwrap()
        );
    }

    #[test]
    fn trial_schedule_needs_only_the_single_slot() {
        let mut session = at_schedule_step(PurchaseType::Trial);
        let mut cmd = schedule_cmd(session.id_typed());
        cmd.weekend_slot = None;
        // Start on a weekday for the trial.
        cmd.start_date = NaiveDate::from_ymd_opt(2025, 11, 18).unwrap();

        let events = session
            .handle(&EnrollmentCommand::SubmitSchedule(cmd))
            .unwrap();
        session.apply(&events[0]);

        let schedule = session.schedule().unwrap();
        assert_eq!(schedule.session_dates.len(), 1);
        assert!(matches!(schedule.slots, TimeSlots::Single { .. }));
    }

    #[test]
    fn starter_pack_requires_both_slots() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        let mut cmd = schedule_cmd(session.id_typed());
        cmd.weekend_slot = None;
        let err = session
            .handle(&EnrollmentCommand::SubmitSchedule(cmd))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("select a weekend session time")
        );
    }

    #[test]
    fn schedule_rejects_rest_day_start() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        let mut cmd = schedule_cmd(session.id_typed());
        cmd.start_date = NaiveDate::from_ymd_opt(2025, 11, 16).unwrap(); // Sunday
        let err = session
            .handle(&EnrollmentCommand::SubmitSchedule(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn schedule_rejects_start_dates_outside_the_window() {
        let session = at_schedule_step(PurchaseType::StarterPack);

        let mut too_soon = schedule_cmd(session.id_typed());
        too_soon.start_date = NaiveDate::from_ymd_opt(2025, 11, 11).unwrap(); // tomorrow
        assert!(
            session
                .handle(&EnrollmentCommand::SubmitSchedule(too_soon))
                .is_err()
        );

        let mut too_late = schedule_cmd(session.id_typed());
        too_late.start_date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert!(
            session
                .handle(&EnrollmentCommand::SubmitSchedule(too_late))
                .is_err()
        );
    }

    #[test]
    fn schedule_rejects_blank_postcode() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        let mut cmd = schedule_cmd(session.id_typed());
        cmd.postcode = "  ".to_string();
        let err = session
            .handle(&EnrollmentCommand::SubmitSchedule(cmd))
            .unwrap_err();
        assert_eq!(err, DomainError::validation("postcode is required"));
    }

    #[test]
    fn back_returns_to_account_without_losing_details() {
        let mut session = at_schedule_step(PurchaseType::StarterPack);
        let events = session
            .handle(&EnrollmentCommand::ReturnToAccount(ReturnToAccount {
                enrollment_id: session.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap();
        session.apply(&events[0]);

        assert_eq!(session.step(), Step::Account);
        assert!(session.account().is_some());
    }

    #[test]
    fn apply_promo_rederives_the_amount_against_the_base_price() {
        let mut session = at_schedule_step(PurchaseType::StarterPack);

        // Caller hands in a tampered amount; handle() must ignore it.
        let mut promo = PromoCodeData::applied("SAVE10".to_string(), 10.0, Money::from_major(120));
        promo.discount_amount = Money::from_major(999);

        let events = session
            .handle(&EnrollmentCommand::ApplyPromo(ApplyPromo {
                enrollment_id: session.id_typed(),
                promo,
                occurred_at: test_time(),
            }))
            .unwrap();
        session.apply(&events[0]);

        assert_eq!(session.promo().discount_amount, Money::from_major(12));

        let breakdown = session.price_breakdown().unwrap();
        assert_eq!(breakdown.final_price, Money::from_major(103));
        assert_eq!(breakdown.applied_discount, Money::from_major(17));
    }

    #[test]
    fn remove_promo_restores_base_minus_fixed_exactly() {
        let mut session = at_schedule_step(PurchaseType::StarterPack);
        let events = session
            .handle(&EnrollmentCommand::ApplyPromo(ApplyPromo {
                enrollment_id: session.id_typed(),
                promo: PromoCodeData::applied("SAVE10".to_string(), 10.0, Money::from_major(120)),
                occurred_at: test_time(),
            }))
            .unwrap();
        session.apply(&events[0]);

        let events = session
            .handle(&EnrollmentCommand::RemovePromo(RemovePromo {
                enrollment_id: session.id_typed(),
                occurred_at: test_time(),
            }))
            .unwrap();
        session.apply(&events[0]);

        assert_eq!(session.promo(), &PromoCodeData::none());
        let breakdown = session.price_breakdown().unwrap();
        assert_eq!(breakdown.final_price, Money::from_major(115));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let session = at_schedule_step(PurchaseType::StarterPack);
        let before_version = session.version();
        let before_step = session.step();

        let events1 = session
            .handle(&EnrollmentCommand::SubmitSchedule(schedule_cmd(
                session.id_typed(),
            )))
            .unwrap();
        let events2 = session
            .handle(&EnrollmentCommand::SubmitSchedule(schedule_cmd(
                session.id_typed(),
            )))
            .unwrap();

        assert_eq!(session.version(), before_version);
        assert_eq!(session.step(), before_step);
        assert_eq!(events1, events2);
    }

    #[test]
    fn version_increments_on_apply() {
        let session = started(PurchaseType::Trial);
        assert_eq!(session.version(), 1);
        let session = at_schedule_step(PurchaseType::Trial);
        assert_eq!(session.version(), 2);
    }
}
