//! Login state of one client

use chrono::{DateTime, Utc};

use artdeck_core::prelude::*;

use super::store::{AuthResult, AuthStore};

/// User name reported while authentication is disabled
pub const PUBLIC_USER: &str = "public";

pub const ADMIN_RIGHT: &str = "admin";
pub const DEFAULT_RIGHT: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    user: Option<String>,
    authenticated: bool,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn need_auth(&self, store: &AuthStore) -> bool {
        store.user_file_exists() && !self.authenticated
    }

    /// `None` while a login is required
    pub fn username(&self, store: &AuthStore) -> Option<String> {
        if self.need_auth(store) {
            return None;
        }
        if store.user_file_exists() {
            return self.user.clone();
        }
        Some(PUBLIC_USER.to_string())
    }

    pub fn is_admin(&self, store: &AuthStore) -> bool {
        if !store.user_file_exists() {
            return false;
        }
        match self.username(store) {
            Some(user) => store
                .user_rights(&user)
                .map(|r| r.iter().any(|x| x == ADMIN_RIGHT))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Check credentials and remember the user on success.
    ///
    /// An unknown user is reported as [`AuthResult::InvalidUser`].
    pub fn login(&mut self, store: &AuthStore, user: &str, password: &str) -> AuthResult {
        let result = Self::check_credentials(store, user, password);
        self.record_login(user, &result);
        result
    }

    /// Password check alone, without touching any client state
    pub fn check_credentials(store: &AuthStore, user: &str, password: &str) -> AuthResult {
        match store.test_username_password(user, password) {
            AuthResult::InvalidId => AuthResult::InvalidUser,
            other => other,
        }
    }

    /// Remember `user` if `result` of [`Self::check_credentials`] is valid
    pub fn record_login(&mut self, user: &str, result: &AuthResult) {
        if result.is_valid() {
            self.user = Some(user.to_string());
            self.authenticated = true;
            info!("User '{}' logged in", user);
        } else {
            debug!("Login of '{}' failed: {:?}", user, result);
        }
    }

    /// Returns whether a user was logged out; the public user never is
    pub fn logout(&mut self, store: &AuthStore) -> bool {
        if !store.user_file_exists() || !self.authenticated {
            return false;
        }
        if self.username(store).as_deref() == Some(PUBLIC_USER) {
            return false;
        }
        self.user = None;
        self.authenticated = false;
        true
    }

    /// Link id owned by the logged in user
    pub fn provide_public_link_id(
        &self,
        store: &AuthStore,
        link: &str,
        expire: DateTime<Utc>,
    ) -> Result<Option<String>> {
        if !self.authenticated {
            return Ok(None);
        }
        match self.username(store) {
            Some(user) => store.provide_public_link_id(&user, link, expire),
            None => Ok(None),
        }
    }
}

/// Store `user` with a random password that nobody knows. The user sets a
/// real one through a reset link.
pub fn add_user_temp_password(
    store: &AuthStore,
    user: &str,
    expire: DateTime<Utc>,
    rights: &[String],
) -> Result<()> {
    let password = uuid::Uuid::new_v4().simple().to_string();
    store.add_user(user, &password, true, Some(expire), rights)
}
