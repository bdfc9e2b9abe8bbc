use std::sync::Arc;

use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::{debug, warn};

use crate::token::TokenProvider;

/// Attaches `Authorization: Bearer <token>` to outgoing requests.
#[derive(Clone)]
pub struct RequestAuthenticator {
    provider: Arc<TokenProvider>,
}

impl RequestAuthenticator {
    pub fn new(provider: Arc<TokenProvider>) -> Self {
        Self { provider }
    }

    /// Overwrites any existing Authorization header when a token is available;
    /// otherwise the request is left untouched and goes out unauthenticated.
    pub async fn authenticate(&self, request: &mut Request) {
        let Some(token) = self.provider.get_token().await else {
            debug!(url = %request.url(), "no access token available; sending unauthenticated");
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(err) => {
                warn!(url = %request.url(), error = %err, "access token is not a valid header value");
            }
        }
    }
}
