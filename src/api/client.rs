//! reqwest implementation of [`Backend`].

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::{Backend, BackendError};
use super::types::{PrivacyRequest, PrivacyResponse, SearchRequest, SearchResponse};

/// Flask's default bind address, where the query service usually runs.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        debug!("{} responded with {}", url, status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Backend error: {} - {}", status, message);
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Undecodable body from {}: {}", url, e);
            BackendError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn query(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError> {
        info!(
            "Query: {} chars, history_access={}",
            request.query.len(),
            request.history_access
        );
        self.post("search", request).await
    }

    async fn submit_option(
        &self,
        request: &PrivacyRequest,
    ) -> Result<PrivacyResponse, BackendError> {
        info!("Submitting option: {}", request.option);
        self.post("privacy", request).await
    }

    async fn enable_history(&self) -> Result<PrivacyResponse, BackendError> {
        info!("Requesting history access");
        self.post("enable-history", &serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:5000/");
        assert_eq!(backend.base_url(), "http://localhost:5000");
    }
}
