//! Session state mirrored from the identity service.
//!
//! The service pushes the session once per connection and again after
//! every change; the client holds `{user, loading}` and nothing else.
//! `loading` is true only until the first push arrives.

use taskdeck_proto::auth::{AuthErrorCode, UserProfile};

/// Which auth flow produced a rejected operation. Known error codes map
/// to fixed user-facing messages; the fallback message depends on the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// Email/password account creation.
    Credential,
    /// Federated provider sign-in.
    Federated,
}

/// The locally mirrored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// The signed-in user, or `None`.
    pub user: Option<UserProfile>,
    /// True until the first auth-state push arrives.
    pub loading: bool,
}

impl SessionState {
    /// Initial state: resolution pending.
    #[must_use]
    pub const fn resolving() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    /// State after an auth-state push.
    #[must_use]
    pub const fn resolved(user: Option<UserProfile>) -> Self {
        Self {
            user,
            loading: false,
        }
    }

    /// Returns the signed-in uid, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }

    /// Returns true once resolution completed with a user present.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        !self.loading && self.user.is_some()
    }

    /// Name to show in the shell: display name if set, else the email.
    #[must_use]
    pub fn shell_identity(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.display_name.as_deref().unwrap_or(u.email.as_str()))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::resolving()
    }
}

/// Maps a rejected auth operation to its user-facing message.
///
/// Known codes get fixed messages; anything else falls back to a generic
/// message for the flow that was attempted.
#[must_use]
pub const fn auth_error_message(code: AuthErrorCode, flow: AuthFlow) -> &'static str {
    match (code, flow) {
        (AuthErrorCode::EmailAlreadyRegistered, _) => "Email is already in use",
        (AuthErrorCode::MalformedEmail, _) => "Invalid email address",
        (AuthErrorCode::WeakPassword, _) => "Password should be at least 6 characters",
        (AuthErrorCode::PopupBlocked, _) => "Popup blocked! Please allow popups for this site.",
        (_, AuthFlow::Federated) => "Google sign-in failed. Please try again.",
        (_, AuthFlow::Credential) => "Something went wrong, try again",
    }
}
