//! read client configuration from values, a file, the environment or AWS Secrets Manager

use std::time::Duration;

use aws_config::BehaviorVersion;

use crate::errors::Error;
use crate::retry::RetryPlan;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint receiving the client-credentials POST.
    pub auth_endpoint: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub max_retry_count: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub retry_server_errors: Option<bool>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Config {
    pub fn from_values(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_endpoint: impl Into<String>,
        api_base_url: Option<String>,
        max_retry_count: Option<u32>,
        retry_delay_ms: Option<u64>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_endpoint: auth_endpoint.into(),
            api_base_url: api_base_url.unwrap_or_else(default_api_base_url),
            max_retry_count,
            retry_delay_ms,
            retry_server_errors: None,
        }
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, Error> {
        Ok(Config {
            client_id: required_env("SPOTIFY_CLIENT_ID")?,
            client_secret: required_env("SPOTIFY_CLIENT_SECRET")?,
            auth_endpoint: required_env("SPOTIFY_AUTH_ENDPOINT")?,
            api_base_url: std::env::var("SPOTIFY_API_BASE_URL")
                .unwrap_or_else(|_| default_api_base_url()),
            max_retry_count: optional_env("SPOTIFY_MAX_RETRY_COUNT")?,
            retry_delay_ms: optional_env("SPOTIFY_RETRY_DELAY_MS")?,
            retry_server_errors: optional_env("SPOTIFY_RETRY_SERVER_ERRORS")?,
        })
    }

    /// Reads a JSON config from the secret named by `SPOTIFY_CONFIG_SECRET_ARN`.
    pub async fn from_secret() -> Result<Self, Error> {
        let secret_arn = required_env("SPOTIFY_CONFIG_SECRET_ARN")?;
        let client = aws_sdk_secretsmanager::Client::new(
            &aws_config::load_defaults(BehaviorVersion::latest()).await,
        );
        let resp = client
            .get_secret_value()
            .secret_id(secret_arn)
            .send()
            .await
            .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
        let secret = match resp.secret_string() {
            Some(s) => Ok(s),
            None => Err(Error::Config(
                "Failed to get secret string, returned None".to_string(),
            )),
        }?;
        let config: Config = serde_json::from_str(secret)?;
        Ok(config)
    }

    pub fn with_server_error_retry(mut self, enabled: bool) -> Self {
        self.retry_server_errors = Some(enabled);
        self
    }

    /// Checks every construction-time invariant before any request is made.
    pub fn validate(&self) -> Result<(), Error> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("You should specify a valid client_id".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::Config(
                "You should specify a valid client_secret".into(),
            ));
        }
        if self.auth_endpoint.trim().is_empty() {
            return Err(Error::Config(
                "You should specify the authorization server's url".into(),
            ));
        }
        parse_url(&self.auth_endpoint).map_err(|e| Error::Config(e.to_string()))?;
        parse_url(&self.api_base_url).map_err(|e| Error::Config(e.to_string()))?;
        self.retry_plan()?;
        Ok(())
    }

    /// The 5xx retry plan, or `None` when server-error retries are disabled.
    pub fn retry_plan(&self) -> Result<Option<RetryPlan>, Error> {
        if !self.retry_server_errors.unwrap_or(true) {
            return Ok(None);
        }
        let defaults = RetryPlan::default_plan();
        let plan = RetryPlan::new(
            self.max_retry_count.unwrap_or(defaults.max_retry_count()),
            self.retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay()),
        )?;
        Ok(Some(plan))
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<reqwest::Url, Error> {
    reqwest::Url::parse(raw).map_err(|e| Error::Url(format!("'{}': {}", raw, e)))
}

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::Config(format!("Missing {} env var", name)))
}

fn optional_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for {} env var: '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
