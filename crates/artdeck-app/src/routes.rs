//! Public links and route gating
//!
//! Remote users reach the web process through two kinds of public links,
//! both backed by link ids in the [`AuthStore`]:
//!
//! - `/resetpw/{user}/{id}` in namespace `resetpw/{user}`, consumed on use
//! - `/productview/{project}/{vg}/{id}` in namespace
//!   `productview/{project}/{vg}`, valid until it expires
//!
//! Project and variant group ids contain `/`, which links carry as `+`.

use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use artdeck_core::prelude::*;

use crate::auth::{add_user_temp_password, AuthResult, AuthStore, LoginState, DEFAULT_RIGHT};

pub const RESETPW_ROUTE: &str = "resetpw";
pub const PRODUCTVIEW_ROUTE: &str = "productview";

/// Minimal length of a new password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Lifetime of an add-user link
pub const ADD_USER_LINK_MINUTES: i64 = 10;

/// Default lifetime of a user created through an add-user link
pub const NEW_USER_DAYS: i64 = 30;

/// Default lifetime of a product view link
pub const PRODUCT_VIEW_LINK_DAYS: i64 = 1;

/// Characters escaped in a path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'+');

/// Id as carried in a link: `/` becomes `+`
pub fn encode_id(id: &str) -> String {
    id.replace('/', "+")
}

pub fn decode_id(id: &str) -> String {
    id.replace('+', "/")
}

pub fn resetpw_namespace(user: &str) -> String {
    format!("{}/{}", RESETPW_ROUTE, user)
}

/// Namespace of product view links, from the ids as carried in the link
pub fn productview_namespace(project: &str, variant_group: &str) -> String {
    format!(
        "{}/{}/{}",
        PRODUCTVIEW_ROUTE,
        encode_id(project),
        encode_id(variant_group)
    )
}

fn segment(text: &str) -> String {
    utf8_percent_encode(text, SEGMENT).to_string()
}

pub fn resetpw_path(user: &str, id: &str) -> String {
    format!("/{}/{}/{}", RESETPW_ROUTE, segment(user), segment(id))
}

pub fn productview_path(project: &str, variant_group: &str, id: &str) -> String {
    format!(
        "/{}/{}/{}/{}",
        PRODUCTVIEW_ROUTE,
        segment(&encode_id(project)),
        segment(&encode_id(variant_group)),
        segment(id)
    )
}

/// Join a route path to the server's base URL
pub fn absolute_url(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| Error::server(format!("invalid link '{}': {}", path, e)))
}

/// Base URL of the web process
pub fn base_url(host: &str, port: u16, tls: bool) -> Result<Url> {
    let scheme = if tls { "https" } else { "http" };
    Url::parse(&format!("{}://{}:{}/", scheme, host, port))
        .map_err(|e| Error::server(format!("invalid server address: {}", e)))
}

// ─────────────────────────────────────────────────────────────────
// Gating
// ─────────────────────────────────────────────────────────────────

/// Check a password reset link; a valid link is consumed
pub fn open_reset_link(store: &AuthStore, user: &str, id: &str) -> AuthResult {
    let result = store.test_public_link_id(&resetpw_namespace(user), id, true);
    if result.is_valid() {
        info!("Password reset link of '{}' used", user);
    } else {
        debug!("Password reset link of '{}' rejected: {:?}", user, result);
    }
    result
}

/// Check a product view link; it stays valid until it expires
pub fn check_product_view_link(
    store: &AuthStore,
    project: &str,
    variant_group: &str,
    id: &str,
) -> AuthResult {
    store.test_public_link_id(&productview_namespace(project, variant_group), id, false)
}

/// Problems with a new password, in the order they are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordProblem {
    TooShort,
    Mismatch,
}

impl PasswordProblem {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "Password must be at least 6 characters long",
            Self::Mismatch => "Passwords do not match",
        }
    }
}

pub fn check_new_password(password: &str, confirm: &str) -> std::result::Result<(), PasswordProblem> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordProblem::TooShort);
    }
    if password != confirm {
        return Err(PasswordProblem::Mismatch);
    }
    Ok(())
}

/// Set the password of `user` after a reset link was opened
pub fn apply_new_password(store: &AuthStore, user: &str, password: &str, confirm: &str) -> Result<()> {
    check_new_password(password, confirm).map_err(|p| Error::auth(p.message()))?;
    store.set_user_password(user, password)
}

// ─────────────────────────────────────────────────────────────────
// Admin actions
// ─────────────────────────────────────────────────────────────────

/// Create `user` with an unknown password and return the link through
/// which they set their own.
///
/// The link expires after [`ADD_USER_LINK_MINUTES`], the user at
/// `user_expire`.
pub fn create_add_user_link(
    store: &AuthStore,
    login: &LoginState,
    base: &Url,
    user: &str,
    user_expire: DateTime<Utc>,
) -> Result<Url> {
    if !login.is_admin(store) {
        return Err(Error::auth("Only administrators can add users"));
    }
    if user.trim().is_empty() {
        return Err(Error::auth("User name must not be empty"));
    }
    let link_expire = Utc::now() + Duration::minutes(ADD_USER_LINK_MINUTES);
    add_user_temp_password(store, user, user_expire, &[DEFAULT_RIGHT.to_string()])?;
    let id = login
        .provide_public_link_id(store, &resetpw_namespace(user), link_expire)?
        .ok_or_else(|| Error::auth("No public link could be created"))?;
    info!("Created add-user link for '{}'", user);
    absolute_url(base, &resetpw_path(user, &id))
}

/// Default expiry of a user created through an add-user link
pub fn default_user_expire() -> DateTime<Utc> {
    Utc::now() + Duration::days(NEW_USER_DAYS)
}

/// Default expiry of a product view link
pub fn default_product_view_expire() -> DateTime<Utc> {
    Utc::now() + Duration::days(PRODUCT_VIEW_LINK_DAYS)
}

/// Link giving access to the product view of a variant group
pub fn create_product_view_link(
    store: &AuthStore,
    login: &LoginState,
    base: &Url,
    project: &str,
    variant_group: &str,
    expire: DateTime<Utc>,
) -> Result<Url> {
    let id = login
        .provide_public_link_id(store, &productview_namespace(project, variant_group), expire)?
        .ok_or_else(|| Error::auth("Public links need a logged in user"))?;
    absolute_url(base, &productview_path(project, variant_group, &id))
}

/// Split a link URL path into route segments, percent-decoded
pub fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .map(|s| percent_encoding::percent_decode_str(s).decode_utf8_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
