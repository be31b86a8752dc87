use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::helpers::time::now_utc;
use crate::sources::TokenResponse;
use crate::utils::constants::EXPIRATION_OFFSET_MS;

/// One OAuth2 token with its expiry bookkeeping.
///
/// `expires_at` is fixed at construction to `now + expires_in - offset`, so a
/// token reads as expired before the provider stops accepting it. A token
/// whose whole lifetime is shorter than the offset is expired from birth.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredToken {
    access_token: String,
    token_type: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in_ms: u64,
        refresh_token: Option<String>,
    ) -> Self {
        Self::with_offset(now_utc(), access_token, token_type, expires_in_ms, refresh_token, EXPIRATION_OFFSET_MS)
    }

    /// Same as [`StoredToken::new`] with an explicit mint instant.
    pub fn new_at(
        now: DateTime<Utc>,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in_ms: u64,
        refresh_token: Option<String>,
    ) -> Self {
        Self::with_offset(now, access_token, token_type, expires_in_ms, refresh_token, EXPIRATION_OFFSET_MS)
    }

    pub fn with_offset(
        now: DateTime<Utc>,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in_ms: u64,
        refresh_token: Option<String>,
        offset_ms: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            refresh_token,
            expires_at: expiry_after(now, expires_in_ms, offset_ms),
        }
    }

    pub fn from_response(response: &TokenResponse) -> Self {
        Self::from_response_at(now_utc(), response, EXPIRATION_OFFSET_MS)
    }

    /// Map a raw token endpoint response; `expires_in` arrives in seconds.
    pub fn from_response_at(now: DateTime<Utc>, response: &TokenResponse, offset_ms: u64) -> Self {
        Self::with_offset(
            now,
            response.access_token.to_owned(),
            response.token_type.to_owned(),
            response.expires_in.saturating_mul(1000),
            response.refresh_token.to_owned(),
            offset_ms,
        )
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn expired(&self) -> bool {
        self.expired_at(now_utc())
    }

    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// `now + expires_in_ms - offset_ms`, saturating at chrono's date range so an
/// out-of-range provider lifetime can never panic.
fn expiry_after(now: DateTime<Utc>, expires_in_ms: u64, offset_ms: u64) -> DateTime<Utc> {
    let lifetime_ms = i64::try_from(expires_in_ms)
        .unwrap_or(i64::MAX)
        .saturating_sub(i64::try_from(offset_ms).unwrap_or(i64::MAX));

    Duration::try_milliseconds(lifetime_ms)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(if lifetime_ms >= 0 { DateTime::<Utc>::MAX_UTC } else { DateTime::<Utc>::MIN_UTC })
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
