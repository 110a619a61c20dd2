//! Login gate
//!
//! A placeholder, not a security boundary: credentials are compared in
//! plain text against two environment secrets and the session token is a
//! reversible base64 of `username:timestamp`. There is no hashing, lockout,
//! rate limiting or revocation. Replace with a signed session mechanism if
//! authentication ever becomes a real requirement.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "syntx-auth";

/// Seven days
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

/// The configured username/password pair
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// A granted session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub timestamp_epoch_ms: u64,
}

/// Checks logins against the configured secrets
#[derive(Debug, Clone)]
pub struct LoginGate {
    credentials: Option<Credentials>,
    secure_cookie: bool,
}

impl LoginGate {
    pub fn new(credentials: Option<Credentials>, secure_cookie: bool) -> Self {
        Self {
            credentials,
            secure_cookie,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Grant a session when both fields match
    pub fn login(&self, request: &LoginRequest, now_ms: u64) -> crate::Result<Session> {
        let Some(credentials) = &self.credentials else {
            tracing::error!("Login attempted but auth secrets are not configured");
            return Err(crate::CommandCenterError::AuthNotConfigured);
        };

        tracing::debug!("Checking credentials for '{}'", request.username);

        if request.username != credentials.username || request.password != credentials.password {
            tracing::warn!("Login rejected for '{}'", request.username);
            return Err(crate::CommandCenterError::InvalidCredentials);
        }

        tracing::info!("Login granted for '{}'", request.username);
        Ok(Session {
            token: issue_token(&request.username, now_ms),
            timestamp_epoch_ms: now_ms,
        })
    }

    /// `Set-Cookie` value carrying the session token
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, token, SESSION_MAX_AGE_SECS
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

pub fn issue_token(username: &str, timestamp_ms: u64) -> String {
    STANDARD.encode(format!("{}:{}", username, timestamp_ms))
}

/// Recover `(username, timestamp)` from a token
pub fn decode_token(token: &str) -> Option<(String, u64)> {
    let bytes = STANDARD.decode(token).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (username, timestamp) = text.rsplit_once(':')?;
    Some((username.to_string(), timestamp.parse().ok()?))
}

/// Username from the session cookie in a `Cookie` header, if any
pub fn session_user(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, token)| decode_token(token))
        .map(|(username, _)| username)
}
