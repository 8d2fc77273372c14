//! HTTP error shape and crate errors
//!
//! [`HttpError`] is the error-like object the transport layer hands to the
//! dispatcher. Every part is optional: a transport failure may carry only a
//! message, a server error only a response status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Response part of an HTTP error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Request part of an HTTP error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// An HTTP or transport failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RequestConfig>,
    /// Transport error code such as `NETWORK_ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl HttpError {
    pub fn new() -> Self {
        Self::default()
    }

    /// An error with a top-level status.
    pub fn status(status: u16) -> Self {
        Self::new().with_status(status)
    }

    /// An error with only a message, as produced by failed fetches.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new().with_message(message)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_response_status(mut self, status: u16) -> Self {
        self.response.get_or_insert_with(HttpResponse::default).status = Some(status);
        self
    }

    #[must_use]
    pub fn with_response_data(mut self, data: serde_json::Value) -> Self {
        self.response.get_or_insert_with(HttpResponse::default).data = Some(data);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.config.get_or_insert_with(RequestConfig::default).url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.config.get_or_insert_with(RequestConfig::default).method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// `status`, falling back to `response.status`.
    pub fn effective_status(&self) -> Option<u16> {
        self.status
            .or_else(|| self.response.as_ref().and_then(|r| r.status))
    }

    pub fn url(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.url.as_deref())
    }

    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.effective_status(), self.message.as_deref()) {
            (Some(status), Some(message)) => write!(f, "HTTP {status}: {message}"),
            (Some(status), None) => write!(f, "HTTP {status}"),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown HTTP error"),
        }?;
        if let Some(url) = self.url() {
            write!(f, " ({url})")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

// ============================================================================
// CRATE ERRORS
// ============================================================================

/// The navigator could not perform a navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("navigation to {path} was rejected: {reason}")]
    Rejected { path: String, reason: String },

    #[error("navigator is not available")]
    Unavailable,
}

/// Persisted client storage failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage is not available: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded while writing `{key}`")]
    QuotaExceeded { key: String },
}

/// Errors returned by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("invalid dispatcher configuration: {0}")]
    Config(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
