//! Signed-in identity: the session value, the identity collaborator seam,
//! and the tracker that turns sign-in/sign-out into change notifications.

mod toolkit;
mod tracker;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::util::http::{BaseUrlError, BodyError};

pub use toolkit::IdentityToolkitClient;
pub use tracker::{SessionChanges, SessionTracker};

// ============================================================================
// Session
// ============================================================================

/// A signed-in user. Absence of a session is `Option::None`.
#[derive(Clone)]
pub struct Session {
    pub user_id: String,
    pub display_avatar_url: Option<String>,
    pub email: Option<String>,
    /// Bearer token for authenticated document reads.
    pub id_token: Arc<SecretString>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, id_token: SecretString) -> Self {
        Self {
            user_id: user_id.into(),
            display_avatar_url: None,
            email: None,
            id_token: Arc::new(id_token),
        }
    }
}

/// Masks the token.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("display_avatar_url", &self.display_avatar_url)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// What the sign-in dialog collects.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

// ============================================================================
// Identity Provider
// ============================================================================

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Sign-in is not configured (missing API key)")]
    NotConfigured,
    #[error("Sign-in rejected: {0}")]
    Rejected(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error(transparent)]
    BaseUrl(#[from] BaseUrlError),
}

impl From<BodyError> for IdentityError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::Network(e) => Self::Network(e),
            BodyError::TooLarge(limit) => Self::ResponseTooLarge(limit),
        }
    }
}

/// The identity collaborator. Opaque: this crate owns no protocol detail
/// beyond "credentials in, session out".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: Credentials) -> Result<Session, IdentityError>;

    async fn sign_out(&self, session: &Session) -> Result<(), IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_token() {
        let session = Session::new("u1", SecretString::from("very-secret-token"));
        let out = format!("{:?}", session);
        assert!(out.contains("u1"));
        assert!(!out.contains("very-secret-token"));
        assert!(out.contains("[REDACTED]"));
    }
}
