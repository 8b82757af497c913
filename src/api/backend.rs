use std::fmt;

use async_trait::async_trait;

use super::types::{PrivacyRequest, PrivacyResponse, SearchRequest, SearchResponse};

/// Errors that can occur while talking to the query service.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Connection refused, DNS failure, body read cut short.
    Network(String),
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
    /// The body was not the JSON we expected.
    Parse(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// The remote query service. One request, one response; no retries and no
/// timeout at this layer.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn name(&self) -> &str;

    /// `POST /search`
    async fn query(&self, request: &SearchRequest) -> Result<SearchResponse, BackendError>;

    /// `POST /privacy`
    async fn submit_option(
        &self,
        request: &PrivacyRequest,
    ) -> Result<PrivacyResponse, BackendError>;

    /// `POST /enable-history`
    async fn enable_history(&self) -> Result<PrivacyResponse, BackendError>;
}

/// What gets rendered for a finished request. Failures become an ordinary
/// chat line prefixed `Error: ` so they travel the same path as real replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub options: Vec<String>,
    pub failed: bool,
}

impl Reply {
    fn failure(error: &BackendError) -> Self {
        Self {
            text: format!("Error: {error}"),
            options: Vec::new(),
            failed: true,
        }
    }

    pub fn from_search(result: Result<SearchResponse, BackendError>) -> Self {
        match result {
            Ok(resp) => Self {
                text: resp.response,
                options: resp.options.unwrap_or_default(),
                failed: false,
            },
            Err(e) => Self::failure(&e),
        }
    }

    pub fn from_privacy(result: Result<PrivacyResponse, BackendError>) -> Self {
        match result {
            Ok(resp) => Self {
                text: resp.response,
                options: Vec::new(),
                failed: false,
            },
            Err(e) => Self::failure(&e),
        }
    }
}
