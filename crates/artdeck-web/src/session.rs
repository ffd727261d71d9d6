//! Session cookies
//!
//! A session id is a random uuid. The cookie carries `{id}.{mac}` where the
//! mac is HMAC-SHA256 of the id keyed with the user's secret, so ids cannot
//! be forged without the secret.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use artdeck_core::prelude::*;

pub const COOKIE_NAME: &str = "artdeck_session";

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &str, id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(id.as_bytes());
    Some(mac)
}

/// Cookie value of session `id`
pub fn sign(secret: &str, id: &str) -> String {
    let tag = keyed(secret, id)
        .map(|mac| URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}.{}", id, tag)
}

/// Session id of a cookie value with a valid mac
pub fn verify(secret: &str, value: &str) -> Option<String> {
    let (id, tag) = value.split_once('.')?;
    if id.is_empty() {
        return None;
    }
    let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
    keyed(secret, id)?.verify_slice(&tag).ok()?;
    Some(id.to_string())
}

fn cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
}

pub fn set_cookie_header(value: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, value)
}

pub fn clear_cookie_header() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", COOKIE_NAME)
}

/// Session of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Cookie value to hand out, for sessions started by this request
    issue: Option<String>,
}

impl Session {
    /// Session named by the request cookie, or a new one
    pub fn resolve(secret: &str, headers: &HeaderMap) -> Self {
        match cookie_value(headers).and_then(|value| verify(secret, value)) {
            Some(id) => Self { id, issue: None },
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                trace!("Starting session {}", id);
                let issue = Some(sign(secret, &id));
                Self { id, issue }
            }
        }
    }

    pub fn is_new(&self) -> bool {
        self.issue.is_some()
    }

    /// Attach the session cookie when the session is new
    pub fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(value) = self.issue {
            match HeaderValue::from_str(&set_cookie_header(&value)) {
                Ok(header) => {
                    response.headers_mut().append(SET_COOKIE, header);
                }
                Err(e) => warn!("Invalid session cookie: {}", e),
            }
        }
        response
    }
}
