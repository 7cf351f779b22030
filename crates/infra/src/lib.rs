//! `tutorflow-infra` — storage and HTTP adapters behind the flow's seams.

pub mod http;
pub mod session_store;

pub use http::{
    CourseDirectory, CourseSummary, DirectoryError, HttpCourseDirectory, HttpPaymentGateway,
    HttpPromoService,
};
pub use session_store::{InMemorySessionStore, SessionStore, SqliteSessionStore, StoreError};
