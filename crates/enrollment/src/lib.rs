//! `tutorflow-enrollment` — the enrollment wizard aggregate.
//!
//! The three-step checkout (account → schedule → payment) modelled as a
//! command-driven aggregate, plus the snapshot record that lets an in-progress
//! enrollment survive page reloads and the payment-redirect round trip.

pub mod contact;
pub mod product;
pub mod session;
pub mod snapshot;

pub use contact::{AccountDetails, ContactDetails};
pub use product::{ProductDetails, PurchaseType, QuizData, derive_product_details};
pub use session::{
    ApplyPromo, EnrollmentCommand, EnrollmentEvent, EnrollmentSession, RemovePromo,
    ReturnToAccount, ScheduleDetails, StartEnrollment, Step, SubmitAccount, SubmitSchedule,
};
pub use snapshot::{ENROLLMENT_SESSION_KEY, EnrollmentSnapshot};
