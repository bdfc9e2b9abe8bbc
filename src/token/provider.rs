use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::credentials::Credentials;
use crate::telemetry::refresh::{RefreshOutcome, RefreshTelemetry};

use super::{CachedToken, Clock, MonotonicClock, TokenResponse};

/// Produces bearer tokens from the client-credentials grant, caching the
/// current one until it expires.
///
/// Concurrent callers that find no usable token queue behind a single
/// authentication attempt and share its outcome.
pub struct TokenProvider {
    credentials: Credentials,
    http_client: Client,
    clock: Arc<dyn Clock>,
    token: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
    completed_attempts: AtomicU64,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_clock(credentials, Arc::new(MonotonicClock))
    }

    pub fn with_clock(credentials: Credentials, clock: Arc<dyn Clock>) -> Self {
        // Bare client: the authentication POST must not go through the authenticator.
        Self::with_http_client(credentials, Client::new(), clock)
    }

    pub fn with_http_client(
        credentials: Credentials,
        http_client: Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            http_client,
            clock,
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            completed_attempts: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns a valid access token, authenticating first when none is cached
    /// or the cached one has expired. `None` means authentication failed.
    pub async fn get_token(&self) -> Option<String> {
        let seen_attempts = self.completed_attempts.load(Ordering::Acquire);
        if let Some(token) = self.valid_token().await {
            return Some(token);
        }

        // Only one authentication attempt should run at a time.
        let _lock = self.refresh_lock.lock().await;
        if self.completed_attempts.load(Ordering::Acquire) != seen_attempts {
            debug!("authentication completed while waiting; sharing its outcome");
            return self.valid_token().await;
        }
        if let Some(token) = self.valid_token().await {
            return Some(token);
        }

        let token_is_stale = self.token.read().await.is_some();
        let telemetry = RefreshTelemetry::new(self.credentials.auth_endpoint().as_str());
        telemetry.emit_start(token_is_stale);

        let outcome = self.authenticate(&telemetry).await;
        let token = match outcome {
            Some(response) => {
                let expires_in = response.expires_in;
                match CachedToken::from_response(response, self.clock.now()) {
                    Some(cached) => {
                        let access_token = cached.access_token().to_string();
                        *self.token.write().await = Some(cached);
                        telemetry.emit_success(expires_in);
                        Some(access_token)
                    }
                    None => {
                        telemetry.emit_failure(
                            RefreshOutcome::Unparsable,
                            &format!("expires_in={} out of range", expires_in),
                        );
                        None
                    }
                }
            }
            None => None,
        };
        self.completed_attempts.fetch_add(1, Ordering::Release);
        token
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.token.read().await.clone()
    }

    async fn valid_token(&self) -> Option<String> {
        let token = self.token.read().await;
        match token.as_ref() {
            Some(cached) if cached.is_valid_at(self.clock.now()) => {
                Some(cached.access_token().to_string())
            }
            Some(cached) => {
                debug!(expires_at = ?cached.expires_at(), "cached token expired");
                None
            }
            None => None,
        }
    }

    async fn authenticate(&self, telemetry: &RefreshTelemetry) -> Option<TokenResponse> {
        let resp = self
            .http_client
            .post(self.credentials.auth_endpoint().clone())
            .header(AUTHORIZATION, self.credentials.basic_authorization())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!(
                "grant_type={}",
                urlencoding::encode("client_credentials")
            ))
            .send()
            .await;
        let resp = match resp {
            Ok(resp) => resp,
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::Unreachable, &err.to_string());
                return None;
            }
        };

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            telemetry.emit_failure(
                RefreshOutcome::Rejected,
                &format!("status={} body='{}'", status, body),
            );
            return None;
        }
        match serde_json::from_str::<TokenResponse>(&body) {
            Ok(response) => Some(response),
            Err(err) => {
                telemetry.emit_failure(RefreshOutcome::Unparsable, &err.to_string());
                None
            }
        }
    }
}
