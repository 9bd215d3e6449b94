use std::sync::Arc;

use crate::error::Result;
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::types::Config;

/// Pushover Open Client API endpoint plus the transport used to reach it.
///
/// Endpoint calls live next to their callers: login and device registration in
/// `auth`, message download and deletion in `messages`.
#[derive(Clone)]
pub struct PushoverClient {
    http: Arc<dyn HttpClient>,
    api_url: String,
    device_name: String,
}

impl std::fmt::Debug for PushoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverClient")
            .field("api_url", &self.api_url)
            .field("device_name", &self.device_name)
            .finish()
    }
}

impl PushoverClient {
    pub fn new(http: Arc<dyn HttpClient>, api_url: &str, device_name: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            device_name: device_name.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http = ReqwestHttpClient::new(config.request_timeout())?;
        Ok(Self::new(Arc::new(http), &config.api_url, &config.device_name))
    }

    pub(crate) fn http(&self) -> &dyn HttpClient {
        self.http.as_ref()
    }

    pub(crate) fn device_name(&self) -> &str {
        &self.device_name
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }
}
