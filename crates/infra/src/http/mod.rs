//! HTTP adapters for the remote collaborators.

mod courses;
mod payment;
mod promo;

pub use courses::{CourseDirectory, CourseSummary, DirectoryError, HttpCourseDirectory};
pub use payment::HttpPaymentGateway;
pub use promo::HttpPromoService;
