//! `tutorflow-auth` — identity/session provider seam.

pub mod identity;

pub use identity::{IdentityError, IdentityProvider, Profile, StaticIdentity};
