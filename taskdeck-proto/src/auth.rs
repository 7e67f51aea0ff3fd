//! Identity types shared between the client and the service.

use serde::{Deserialize, Serialize};

/// The authenticated identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque user identifier assigned by the identity service.
    pub uid: String,
    /// The account's email address.
    pub email: String,
    /// Optional display name, settable via profile update.
    pub display_name: Option<String>,
}

/// Federated identity providers the service can delegate sign-in to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FederatedProvider {
    /// Google OAuth sign-in.
    Google,
}

impl std::fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "Google"),
        }
    }
}

/// Error codes the identity service reports for rejected auth operations.
///
/// Known codes map to fixed user-facing messages in the client; anything
/// the client does not recognize falls back to a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AuthErrorCode {
    /// The email is already registered to an account.
    #[error("email already registered")]
    EmailAlreadyRegistered,
    /// The email address is structurally invalid.
    #[error("malformed email address")]
    MalformedEmail,
    /// The password does not meet the minimum length requirement.
    #[error("password too weak")]
    WeakPassword,
    /// The federated provider's sign-in window could not be opened.
    #[error("sign-in popup blocked")]
    PopupBlocked,
    /// The operation requires a signed-in session.
    #[error("not signed in")]
    NotSignedIn,
    /// Unspecified service-side failure.
    #[error("internal identity service error")]
    Internal,
}
