use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;

use crate::config::{Config, parse_url};
use crate::errors::Error;

/// Encodes `input` with the RFC 4648 standard alphabet, padded with `=`.
pub fn encode_base64(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

/// Immutable client-credentials material for the token endpoint.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    auth_endpoint: Url,
    basic_key: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        auth_endpoint: &str,
    ) -> Result<Self, Error> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() {
            return Err(Error::Config("You should specify a valid client_id".into()));
        }
        if client_secret.trim().is_empty() {
            return Err(Error::Config(
                "You should specify a valid client_secret".into(),
            ));
        }
        let auth_endpoint = parse_url(auth_endpoint).map_err(|e| Error::Config(e.to_string()))?;
        let basic_key = encode_base64(&format!("{}:{}", client_id, client_secret));
        Ok(Self {
            client_id,
            auth_endpoint,
            basic_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(
            config.client_id.as_str(),
            config.client_secret.as_str(),
            &config.auth_endpoint,
        )
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn auth_endpoint(&self) -> &Url {
        &self.auth_endpoint
    }

    /// Value for the `Authorization` header of the token request.
    pub fn basic_authorization(&self) -> String {
        format!("Basic {}", self.basic_key)
    }
}

// The secret must never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("auth_endpoint", &self.auth_endpoint.as_str())
            .finish_non_exhaustive()
    }
}
