use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contact profile of the signed-in account, used to prefill the account
/// step of the enrollment wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Whether the account belongs to a parent/guardian (vs. the student).
    pub is_parent: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no active session")]
    NotAuthenticated,

    #[error("token retrieval failed: {0}")]
    TokenRetrieval(String),
}

/// Identity/session provider.
///
/// Note: token acquisition and verification are intentionally outside this
/// crate. Implementations wrap whatever auth SDK the host application uses;
/// this seam only exposes what the flow consumes.
pub trait IdentityProvider: Send + Sync {
    /// Bearer token for API calls, retrievable on demand.
    fn bearer_token(&self) -> Result<String, IdentityError>;

    /// Contact profile of the signed-in account, when known.
    fn profile(&self) -> Option<Profile>;
}

/// Fixed-token provider for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    token: String,
    profile: Option<Profile>,
}

impl StaticIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            profile: None,
        }
    }

    pub fn with_profile(token: impl Into<String>, profile: Profile) -> Self {
        Self {
            token: token.into(),
            profile: Some(profile),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn bearer_token(&self) -> Result<String, IdentityError> {
        if self.token.is_empty() {
            return Err(IdentityError::NotAuthenticated);
        }
        Ok(self.token.clone())
    }

    fn profile(&self) -> Option<Profile> {
        self.profile.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_identity_returns_its_token() {
        let identity = StaticIdentity::new("token-123");
        assert_eq!(identity.bearer_token().unwrap(), "token-123");
        assert!(identity.profile().is_none());
    }

    #[test]
    fn empty_token_means_not_authenticated() {
        let identity = StaticIdentity::default();
        assert_eq!(
            identity.bearer_token().unwrap_err(),
            IdentityError::NotAuthenticated
        );
    }

    #[test]
    fn profile_is_exposed_when_present() {
        let profile = Profile {
            first_name: "Sam".to_string(),
            is_parent: true,
            ..Profile::default()
        };
        let identity = StaticIdentity::with_profile("token", profile.clone());
        assert_eq!(identity.profile(), Some(profile));
    }
}
