//! Shared plumbing for JSON status endpoints

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{HttpError, Result};

/// Timeout applied by [`default_client`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("pipewatch/", env!("CARGO_PKG_VERSION"));

/// Build a client with a request timeout and nothing else.
///
/// Callers that need proxies, auth headers or custom TLS build their own
/// `reqwest::Client` and hand it to the provider instead.
pub fn default_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Parse an endpoint URL, accepting only `http` and `https`.
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(HttpError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}

/// A single GET endpoint returning JSON.
#[derive(Debug, Clone)]
pub(crate) struct JsonEndpoint {
    client: Client,
    url: Url,
}

impl JsonEndpoint {
    pub(crate) fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// GET the endpoint with `query` and decode the body as `T`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<T> {
        debug!(url = %self.url, ?query, "GET status endpoint");

        let response = self
            .client
            .get(self.url.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::status(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_accepts_http_and_https() {
        assert!(parse_endpoint("http://localhost:8080/runs").is_ok());
        assert!(parse_endpoint("https://ci.example.com/api/runs").is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        let err = parse_endpoint("ftp://ci.example.com/runs").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl(ref m) if m.contains("ftp")));

        let err = parse_endpoint("not a url").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl(_)));
    }

    #[test]
    fn test_default_client_builds() {
        assert!(default_client(Duration::from_secs(1)).is_ok());
    }
}
