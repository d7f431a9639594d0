//! Bearer token signing and the authenticated-user extractor.
//!
//! A token is `<user_uuid>.<expires_at_unix>.<mac_hex>`, where the MAC is a keyed
//! BLAKE3 hash of the first two parts. The key is derived from the configured
//! secret, so rotating the secret invalidates every outstanding token.

use crate::{
    api::AppState,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use uuid::Uuid;

const KEY_CONTEXT: &str = "fincore 2025-01-01 bearer token mac v1";

fn unauthorized(message: &str) -> Error {
    Error::Unauthorized {
        message: message.to_string(),
    }
}

/// Issues and verifies bearer tokens.
pub struct TokenSigner {
    key: [u8; 32],
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Derives the MAC key from the configured secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
        }
    }

    fn mac_hex(&self, payload: &str) -> String {
        blake3::keyed_hash(&self.key, payload.as_bytes())
            .to_hex()
            .to_string()
    }

    /// Mints a token for `user_id` valid for `ttl` from now.
    ///
    /// Fails with [`Error::Config`] when `ttl` is not positive or the expiry
    /// falls outside the representable date range.
    pub fn issue(&self, user_id: Uuid, ttl: TimeDelta) -> Result<String> {
        if ttl <= TimeDelta::zero() {
            return Err(Error::Config {
                message: "Token lifetime must be positive".to_string(),
            });
        }
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Config {
                message: "Token expiry is out of range".to_string(),
            })?;
        Ok(self.issue_until(user_id, expires_at.timestamp()))
    }

    /// Mints a token that expires at the given unix timestamp.
    #[must_use]
    pub fn issue_until(&self, user_id: Uuid, expires_at: i64) -> String {
        let payload = format!("{user_id}.{expires_at}");
        let mac = self.mac_hex(&payload);
        format!("{payload}.{mac}")
    }

    /// Checks the MAC and expiry, returning the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let mut parts = token.splitn(3, '.');
        let (Some(user_part), Some(expiry_part), Some(mac_part)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(unauthorized("Malformed token"));
        };

        let expected = self.mac_hex(&format!("{user_part}.{expiry_part}"));
        if !bool::from(expected.as_bytes().ct_eq(mac_part.as_bytes())) {
            warn!("Token signature mismatch");
            return Err(unauthorized("Invalid token"));
        }

        let expires_at: i64 = expiry_part
            .parse()
            .map_err(|_| unauthorized("Malformed token"))?;
        if expires_at <= Utc::now().timestamp() {
            return Err(unauthorized("Token expired"));
        }

        Uuid::parse_str(user_part).map_err(|_| unauthorized("Malformed token"))
    }
}

/// Converts an operator-supplied lifetime in hours into a [`TimeDelta`].
pub fn ttl_from_hours(hours: i64) -> Result<TimeDelta> {
    if hours <= 0 {
        return Err(Error::Config {
            message: format!("Token TTL must be at least one hour, got {hours}"),
        });
    }
    TimeDelta::try_hours(hours).ok_or_else(|| Error::Config {
        message: format!("Token TTL of {hours} hours is out of range"),
    })
}

/// The authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or_else(|| unauthorized("Missing bearer token"))?;

        let user_id = state.tokens.verify(token.trim())?;
        debug!(%user_id, "Authenticated request");
        Ok(Self(user_id))
    }
}

/// `GET /auth/me` - echoes the identity carried by the token.
pub async fn me(AuthUser(user_id): AuthUser) -> Json<Value> {
    Json(json!({ "user_id": user_id }))
}
