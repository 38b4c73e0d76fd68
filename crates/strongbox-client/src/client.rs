//! HTTP client for the Strongbox server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A group of secrets decoded from the server's JSON response.
pub type SecretMap = serde_json::Map<String, serde_json::Value>;

/// Read access to a Strongbox server.
#[async_trait]
pub trait SecretsApi: Send + Sync {
    /// Fetches a single scalar secret.
    async fn get_secret(&self, path: &str) -> ClientResult<String>;

    /// Fetches a group of secrets.
    async fn get_secrets(&self, path: &str) -> ClientResult<SecretMap>;
}

/// HTTP client for a Strongbox server.
///
/// Every call builds a fresh request from the base URL and token, so a
/// single client can be shared freely between tasks. Calls are never
/// retried.
#[derive(Clone)]
pub struct SecretsClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl std::fmt::Debug for SecretsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SecretsClient {
    /// Create a new client with the default timeout.
    pub fn new(url: &str, token: impl Into<String>) -> ClientResult<Self> {
        Self::with_timeout(url, token, crate::config::DEFAULT_TIMEOUT)
    }

    /// Create a new client from configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::build(&config.url, config.token.clone(), config.timeout)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(
        url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        Self::build(url, SecretString::from(token.into()), timeout)
    }

    fn build(url: &str, token: SecretString, timeout: Duration) -> ClientResult<Self> {
        let mut base_url =
            Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{url}: not usable as a base URL"
            )));
        }

        base_url.set_query(None);
        base_url.set_fragment(None);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Returns the base URL requests are made against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches a single scalar secret.
    ///
    /// Returns [`ClientError::SecretNotFound`] if nothing exists at `path`.
    pub async fn get_secret(&self, path: &str) -> ClientResult<String> {
        let response = self.fetch(path).await?;
        response.text().await.map_err(ClientError::Http)
    }

    /// Fetches a group of secrets as a JSON mapping.
    ///
    /// Returns [`ClientError::SecretNotFound`] if nothing exists at `path`,
    /// and [`ClientError::Decode`] if the path names a scalar.
    pub async fn get_secrets(&self, path: &str) -> ClientResult<SecretMap> {
        let response = self.fetch(path).await?;
        let body = response.bytes().await.map_err(ClientError::Http)?;
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }

    /// Issues the request and maps non-success statuses to errors.
    async fn fetch(&self, path: &str) -> ClientResult<Response> {
        let url = self.secret_url(path);
        tracing::debug!(path = %path, "Requesting secret");

        let response = self
            .client
            .get(url)
            .query(&[("token", self.token.expose_secret())])
            .send()
            .await
            .map_err(ClientError::Http)?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ClientError::SecretNotFound),
            status => {
                let message = response.text().await.map_err(ClientError::Http)?;
                tracing::debug!(path = %path, status = %status, "Secret request failed");
                Err(ClientError::Server { status, message })
            }
        }
    }

    /// Appends the secret path to the base URL, one encoded segment at a
    /// time.
    fn secret_url(&self, path: &str) -> Url {
        let path = path.strip_prefix('/').unwrap_or(path);
        let mut url = self.base_url.clone();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            if path.is_empty() {
                segments.push("");
            } else {
                segments.extend(path.split('/'));
            }
        }

        url
    }
}

#[async_trait]
impl SecretsApi for SecretsClient {
    async fn get_secret(&self, path: &str) -> ClientResult<String> {
        SecretsClient::get_secret(self, path).await
    }

    async fn get_secrets(&self, path: &str) -> ClientResult<SecretMap> {
        SecretsClient::get_secrets(self, path).await
    }
}
