//! HTTP transport for a remote `rclone rcd` instance.

use super::{normalize_params, RpcReply, Transport};
use crate::config::RcConfig;
use crate::{RcError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Transport that POSTs each call to `{base_url}/{method}`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    /// Create a transport for the RC endpoint at `base_url`.
    ///
    /// Uses the fixed request timeout from [`RcConfig::REQUEST_TIMEOUT`].
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, RcConfig::REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| RcError::Config(format!("invalid rc url {:?}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RcError::Config(format!(
                "unsupported rc url scheme: {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(RcConfig::USER_AGENT)
            .build()
            .map_err(|e| RcError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials: None,
        })
    }

    /// Send HTTP Basic credentials with every call.
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        if !username.is_empty() {
            self.credentials = Some((username.to_string(), password.to_string()));
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: &str) -> RpcReply {
        let url = self.endpoint(method);
        let params = normalize_params(params).to_string();
        debug!("rc POST {}", url);

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(params);
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("rc POST {} failed (timeout={}): {}", url, e.is_timeout(), e);
                return RpcReply::failure(e);
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => RpcReply::new(status, body),
            Err(e) => RpcReply::failure(format!("failed to read response body: {}", e)),
        }
    }
}
