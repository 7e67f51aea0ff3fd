//! In-memory account registry for the identity side of the emulator.
//!
//! Holds registered accounts and validates credential sign-ups the way the
//! managed identity service does: structural email check, minimum password
//! length, unique email. Sessions are per connection and live in the
//! server layer; this registry only owns accounts.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use taskdeck_proto::auth::{AuthErrorCode, FederatedProvider, UserProfile};

/// Minimum accepted password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 6;

/// A registered account.
#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    display_name: Option<String>,
    /// Empty for federated accounts, which have no local password.
    password: String,
}

impl Account {
    fn profile(&self) -> UserProfile {
        UserProfile {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Thread-safe account registry keyed by lowercased email.
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a credential account and returns its profile. The
    /// display name starts unset; clients set it with a follow-up profile
    /// update.
    ///
    /// # Errors
    ///
    /// - [`AuthErrorCode::MalformedEmail`] if the email fails the
    ///   structural check.
    /// - [`AuthErrorCode::WeakPassword`] if the password is shorter than
    ///   six characters.
    /// - [`AuthErrorCode::EmailAlreadyRegistered`] if the email (case
    ///   insensitive) already has an account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserProfile, AuthErrorCode> {
        if !email_is_well_formed(email) {
            return Err(AuthErrorCode::MalformedEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthErrorCode::WeakPassword);
        }

        let key = email.to_lowercase();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AuthErrorCode::EmailAlreadyRegistered);
        }

        let account = Account {
            uid: mint_uid(),
            email: email.to_string(),
            display_name: None,
            password: password.to_string(),
        };
        let profile = account.profile();
        accounts.insert(key, account);
        Ok(profile)
    }

    /// Signs in via a federated provider, creating the provider-backed
    /// account on first use and reusing it afterwards.
    ///
    /// The emulator stands in for the provider's account-selection flow
    /// with a single configured identity (`federated_email`).
    pub async fn sign_in_federated(
        &self,
        provider: FederatedProvider,
        federated_email: &str,
    ) -> UserProfile {
        let key = federated_email.to_lowercase();
        let mut accounts = self.accounts.write().await;
        if let Some(account) = accounts.get(&key) {
            return account.profile();
        }

        let account = Account {
            uid: mint_uid(),
            email: federated_email.to_string(),
            display_name: Some(format!("{provider} User")),
            password: String::new(),
        };
        let profile = account.profile();
        accounts.insert(key, account);
        profile
    }

    /// Rewrites the display name of the account with the given uid and
    /// returns the updated profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthErrorCode::Internal`] if no account has that uid.
    pub async fn update_display_name(
        &self,
        uid: &str,
        display_name: &str,
    ) -> Result<UserProfile, AuthErrorCode> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|a| a.uid == uid)
            .ok_or(AuthErrorCode::Internal)?;
        account.display_name = if display_name.trim().is_empty() {
            None
        } else {
            Some(display_name.to_string())
        };
        Ok(account.profile())
    }
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// domain containing a dot with non-empty labels around it.
fn email_is_well_formed(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain
        .split_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}

/// Mints an opaque uid for a new account.
fn mint_uid() -> String {
    Uuid::now_v7().simple().to_string()
}
