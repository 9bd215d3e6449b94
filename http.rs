//! Transport seam so the API calls can be exercised without a network.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::error::{PushoverError, Result};

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// GET with query-string parameters
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse>;

    /// POST with a form-encoded body
    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// reqwest-backed client. Every request is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushoverError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse> {
        // query carries the secret, so only the url is logged
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                PushoverError::Connection(format!("GET {} failed: {}", url, e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                PushoverError::Connection(format!("Reading response body: {}", e.without_url()))
            })?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<HttpResponse> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                PushoverError::Connection(format!("POST {} failed: {}", url, e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                PushoverError::Connection(format!("Reading response body: {}", e.without_url()))
            })?;

        debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port 1 is reserved and never listening.
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/test";

    fn client() -> ReqwestHttpClient {
        ReqwestHttpClient::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn get_connection_refused_is_connection_error() {
        let err = client()
            .get(UNREACHABLE_URL, &[("secret", "s")])
            .await
            .unwrap_err();

        match &err {
            PushoverError::Connection(msg) => {
                assert!(msg.starts_with("GET http://127.0.0.1:1/test failed:"), "{msg}");
                assert!(!msg.contains("secret=s"), "{msg}");
            }
            other => panic!("expected PushoverError::Connection, got {other:?}"),
        }
        assert_eq!(err.kind(), "connection_error");
    }

    #[tokio::test]
    async fn post_form_connection_refused_is_connection_error() {
        let err = client()
            .post_form(UNREACHABLE_URL, &[("key", "value")])
            .await
            .unwrap_err();

        match &err {
            PushoverError::Connection(msg) => {
                assert!(msg.starts_with("POST http://127.0.0.1:1/test failed:"), "{msg}");
                // reqwest's own url suffix is stripped, leaving only ours
                assert_eq!(msg.matches("127.0.0.1:1").count(), 1, "{msg}");
            }
            other => panic!("expected PushoverError::Connection, got {other:?}"),
        }
    }
}
