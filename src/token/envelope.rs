use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body returned by the token endpoint for a client-credentials grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Typically `bearer`. Informational only.
    pub token_type: String,
    /// Seconds the token is granted for.
    pub expires_in: u64,
}

/// The current access token and the instant it stops being usable.
#[derive(Clone, Debug)]
pub struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    pub fn new(access_token: String, expires_at: Instant) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    /// Stamps a token response received at `now`. `None` when `expires_in`
    /// lies beyond what the clock can represent.
    pub fn from_response(response: TokenResponse, now: Instant) -> Option<Self> {
        let expires_at = now.checked_add(Duration::from_secs(response.expires_in))?;
        Some(Self::new(response.access_token, expires_at))
    }

    /// Returns the raw token value suitable for Authorization headers.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}
