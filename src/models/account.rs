//! Connected Google account model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A connected Google Business Profile account with its OAuth tokens.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Local database ID.
    pub id: i64,

    /// Google account email address.
    pub google_email: String,

    /// Current OAuth access token.
    pub access_token: String,

    /// OAuth refresh token (absent if Google did not issue one).
    pub refresh_token: Option<String>,

    /// Access token expiry (Unix seconds).
    pub token_expiry: Option<i64>,

    /// Unix timestamp of creation.
    pub created_at: i64,

    /// Unix timestamp of last token update.
    pub updated_at: i64,
}

impl Account {
    /// Check whether the access token is expired or expires within `skew_secs`.
    ///
    /// A missing expiry is treated as expired so the token gets refreshed
    /// before use.
    pub fn token_expires_within(&self, now: i64, skew_secs: i64) -> bool {
        match self.token_expiry {
            Some(expiry) => now >= expiry - skew_secs,
            None => true,
        }
    }
}
