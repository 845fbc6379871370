//! Session state shared by the authentication flow and the model operations.

use jujulib_wire::{FacadeTable, Macaroon, TagError, UserTag};
use std::fmt;

/// Login credentials: a user/password pair, a macaroon set, or both.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub macaroons: Option<Vec<Macaroon>>,
}

impl Credentials {
    pub fn password(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            macaroons: None,
        }
    }

    pub fn macaroons(macaroons: Vec<Macaroon>) -> Self {
        Self {
            macaroons: Some(macaroons),
            ..Self::default()
        }
    }

    /// True when there is enough to attempt a login.
    pub fn are_available(&self) -> bool {
        let has_password = !self.user.is_empty() && !self.password.is_empty();
        let has_macaroons = self.macaroons.as_ref().is_some_and(|m| !m.is_empty());
        has_password || has_macaroons
    }

    /// The user as a tag; `None` when no user is known.
    pub fn user_tag(&self) -> Option<Result<UserTag, TagError>> {
        (!self.user.is_empty()).then(|| UserTag::parse(&self.user))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field(
                "password",
                &if self.password.is_empty() { "" } else { "<redacted>" },
            )
            .field("macaroons", &self.macaroons.as_ref().map(Vec::len))
            .finish()
    }
}

/// Where the session is in the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// A login request is in flight
    LoginPending,
    /// Waiting for the bakery to discharge a macaroon
    DischargePending,
    Authenticated,
    /// The last attempt was rejected; a new login resets this
    Failed,
}

impl AuthState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthState::LoginPending | AuthState::DischargePending)
    }
}

/// Notifications broadcast to session observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login attempt finished
    Login { result: bool },
    /// The connection was closed locally
    Closed,
}

/// Everything a login replaces. Kept behind one lock so observers never see
/// credentials from one login next to facades from another.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub credentials: Credentials,
    pub facades: FacadeTable,
    pub state: AuthState,
    /// Sticky until the next successful login; callers use it to avoid retry loops.
    pub failed_authentication: bool,
    pub read_only: bool,
    pub server_version: Option<String>,
}

impl Session {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials: credentials.unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_availability() {
        assert!(!Credentials::default().are_available());
        assert!(Credentials::password("user", "password").are_available());
        assert!(!Credentials::password("user", "").are_available());
        assert!(!Credentials::password("", "password").are_available());
        assert!(Credentials::macaroons(vec![json!("m")]).are_available());
        assert!(!Credentials::macaroons(vec![]).are_available());
    }

    #[test]
    fn test_user_tag() {
        assert!(Credentials::default().user_tag().is_none());
        let tag = Credentials::password("user-who", "x")
            .user_tag()
            .unwrap()
            .unwrap();
        assert_eq!(tag.to_string(), "user-who");
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::password("user", "tardis"));
        assert!(!debug.contains("tardis"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_pending_states() {
        assert!(AuthState::LoginPending.is_pending());
        assert!(AuthState::DischargePending.is_pending());
        assert!(!AuthState::Failed.is_pending());
        assert!(!AuthState::default().is_pending());
    }
}
