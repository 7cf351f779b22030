use serde::{Deserialize, Serialize};

use tutorflow_core::{DomainError, DomainResult};

/// Name/email/phone fields for one party on the booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Step 1 output: the student taking the sessions and the guardian paying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub student: ContactDetails,
    pub guardian: ContactDetails,
}

impl AccountDetails {
    /// Required-field check for the account step.
    ///
    /// Student phone is the only optional field; the guardian is the contact
    /// of record and must be fully reachable.
    pub fn validate(&self) -> DomainResult<()> {
        require(&self.student.first_name, "student first name")?;
        require(&self.student.last_name, "student last name")?;
        require(&self.student.email, "student email")?;
        require(&self.guardian.first_name, "guardian first name")?;
        require(&self.guardian.last_name, "guardian last name")?;
        require(&self.guardian.email, "guardian email")?;
        require(&self.guardian.phone, "guardian phone")?;
        Ok(())
    }
}

fn require(value: &str, field: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        Err(DomainError::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}
