//! Stateless signed tokens.
//!
//! A token is `base64url(user_id "." expires_at "." signature)` where `signature` is the
//! base64url HMAC-SHA256 of `user_id "." expires_at` under the server secret. Validity is
//! established by recomputing the MAC; nothing is stored server-side.
use std::fmt;
use std::time::Duration;

use axum::extract::FromRef;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Any parse failure: bad encoding, wrong shape, expired or forged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid or expired token")]
pub struct InvalidToken;

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Issue a token for `user_id` that expires `ttl` after `now` (Unix seconds).
pub fn issue_at(user_id: &str, secret: &[u8], ttl: Duration, now: i64) -> anyhow::Result<String> {
    anyhow::ensure!(!user_id.is_empty(), "user id must not be empty");
    let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let expires_at = now.saturating_add(ttl_secs);
    let message = format!("{}.{}", user_id, expires_at);

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    mac.update(message.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}.{}", message, signature)))
}

pub fn issue(user_id: &str, secret: &[u8], ttl: Duration) -> anyhow::Result<String> {
    issue_at(user_id, secret, ttl, now_unix())
}

/// Validate `token` at time `now` and return the embedded user id.
pub fn parse_at(token: &str, secret: &[u8], now: i64) -> Result<String, InvalidToken> {
    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| InvalidToken)?;
    let decoded = String::from_utf8(bytes).map_err(|_| InvalidToken)?;

    // Split from the right: signature and expiry never contain dots, the user id may.
    let mut fields = decoded.rsplitn(3, '.');
    let (Some(signature), Some(expires_str), Some(user_id)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(InvalidToken);
    };
    if user_id.is_empty() {
        return Err(InvalidToken);
    }

    let expires_at: i64 = expires_str.parse().map_err(|_| InvalidToken)?;
    if now > expires_at {
        return Err(InvalidToken);
    }

    let message = &decoded[..decoded.len() - signature.len() - 1];
    let received = URL_SAFE_NO_PAD.decode(signature).map_err(|_| InvalidToken)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| InvalidToken)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&received).map_err(|_| InvalidToken)?;

    Ok(user_id.to_string())
}

pub fn parse(token: &str, secret: &[u8]) -> Result<String, InvalidToken> {
    parse_at(token, secret, now_unix())
}

/// Secret and lifetime used to mint and check tokens.
#[derive(Clone)]
pub struct TokenKeys {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str) -> anyhow::Result<String> {
        let token = issue(user_id, &self.secret, self.ttl)?;
        debug!(user_id = %user_id, "token issued");
        Ok(token)
    }

    pub fn parse(&self, token: &str) -> Result<String, InvalidToken> {
        parse(token, &self.secret)
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.keys().clone()
    }
}
