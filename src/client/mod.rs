use std::sync::Arc;

use reqwest::{Client, Url};

use crate::retry::RetryCoordinator;
use crate::token::TokenProvider;

mod authenticator;
mod impls;

pub use authenticator::RequestAuthenticator;

/// HTTP client whose requests are authenticated with a client-credentials
/// token and resent on rate limiting or upstream server errors.
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
    provider: Arc<TokenProvider>,
    authenticator: RequestAuthenticator,
    retry: Arc<RetryCoordinator>,
}
