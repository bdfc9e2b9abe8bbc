use std::sync::Arc;

use reqwest::{Client, Method, Request, RequestBuilder, Response, Url};
use tracing::{debug, info};

use crate::{
    ApiClient,
    client::RequestAuthenticator,
    config::{Config, parse_url},
    credentials::Credentials,
    errors::Error,
    retry::{RetryCoordinator, RetryPlan},
    token::{Clock, MonotonicClock, TokenProvider},
};

const USER_AGENT: &str = concat!("spotify-oauth-client/", env!("CARGO_PKG_VERSION"));

impl ApiClient {
    /// Create a new ApiClient
    /// # Arguments
    /// * `config` - Explicit configuration (`Config`), typically loaded via `Config::from_file` or `Config::from_env`.
    /// # ENV Vars (when using `Config::from_env`)
    /// * `SPOTIFY_CLIENT_ID` - OAuth2 client id
    /// * `SPOTIFY_CLIENT_SECRET` - OAuth2 client secret
    /// * `SPOTIFY_AUTH_ENDPOINT` - Token endpoint for the client-credentials grant
    /// * `SPOTIFY_API_BASE_URL` - Optional base URL of the protected API
    /// * `SPOTIFY_MAX_RETRY_COUNT`, `SPOTIFY_RETRY_DELAY_MS` - Optional 5xx retry plan
    /// * `SPOTIFY_RETRY_SERVER_ERRORS` - Set to `false` to disable 5xx retries
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Same as [`ApiClient::new`] with an explicit time source for token expiry.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        config.validate()?;
        let retry_plan = config.retry_plan()?;
        let credentials = Credentials::from_config(&config)?;
        let provider = Arc::new(TokenProvider::with_clock(credentials, clock));
        Self::from_parts(&config.api_base_url, provider, retry_plan)
    }

    /// Assembles a client around an existing token provider.
    pub fn from_parts(
        api_base_url: &str,
        provider: Arc<TokenProvider>,
        retry_plan: Option<RetryPlan>,
    ) -> Result<Self, Error> {
        let base_url = parse_url(api_base_url).map_err(|e| Error::Config(e.to_string()))?;
        let http_client = Client::builder().user_agent(USER_AGENT).build()?;
        info!(
            base_url = %base_url,
            client_id = provider.credentials().client_id(),
            server_error_retry = ?retry_plan,
            "api client ready"
        );
        Ok(Self {
            http_client,
            base_url,
            authenticator: RequestAuthenticator::new(Arc::clone(&provider)),
            provider,
            retry: Arc::new(RetryCoordinator::new(retry_plan)),
        })
    }

    pub fn token_provider(&self) -> Arc<TokenProvider> {
        Arc::clone(&self.provider)
    }

    pub fn retry(&self) -> Arc<RetryCoordinator> {
        Arc::clone(&self.retry)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the API base URL. Absolute URLs are accepted
    /// only on the base URL's origin, since the bearer token is attached to them.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        if path.contains("://") {
            let url = parse_url(path)?;
            if url.origin() != self.base_url.origin() {
                return Err(Error::Url(format!(
                    "'{}' is outside the API origin {}",
                    url,
                    self.base_url.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        parse_url(&format!("{}/{}", base, path.trim_start_matches('/')))
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.http_client.request(method, self.endpoint(path)?))
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder, Error> {
        self.request(Method::GET, path)
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, Error> {
        self.execute(builder.build()?).await
    }

    /// Sends `request` with a bearer token, resending it on 429 or 5xx as configured.
    pub async fn execute(&self, mut request: Request) -> Result<Response, Error> {
        self.authenticator.authenticate(&mut request).await;

        let method = request.method().clone();
        let url = request.url().clone();
        let http_client = self.http_client.clone();
        let mut template = Some(request);
        let (response, outcome) = self
            .retry
            .execute(|attempt| {
                let next = match template.as_ref().and_then(Request::try_clone) {
                    Some(copy) => Ok(copy),
                    None => template
                        .take()
                        .ok_or_else(|| Error::Replay(url.to_string())),
                };
                let client = http_client.clone();
                async move {
                    let resp = client.execute(next?).await?;
                    debug!(attempt, status = %resp.status(), "response received");
                    Ok::<_, Error>(resp)
                }
            })
            .await?;

        debug!(
            method = %method,
            url = %url,
            status = %response.status(),
            attempts = outcome.attempts,
            "request completed"
        );
        Ok(response)
    }
}
