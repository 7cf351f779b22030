use tutorflow_core::EnrollmentId;

/// A command targets a specific enrollment (command abstraction).
///
/// Commands represent **intent** - a request to perform an action on an
/// aggregate. They are **transient** (not persisted) and are transformed into
/// events.
///
/// ## Command vs Event
///
/// - **Command**: Intent to do something (e.g., "Submit the account step")
/// - **Event**: Fact that something happened (e.g., "AccountSubmitted { .. }")
///
/// Commands are rejected if invalid (validation errors). Events represent
/// accepted changes.
///
/// ## Design Constraints
///
/// Commands must be:
/// - **Cloneable**: Commands may be copied for retries, logging, etc.
/// - **Send + Sync**: Commands cross thread boundaries (async handlers)
/// - **'static**: Commands don't contain borrowed data (must own all data)
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_enrollment_id(&self) -> EnrollmentId;
}
