//! Structured validation errors
//!
//! A [`ValidationError`] is plain data: produced by rule evaluation or parsed
//! from a server response, collected into lists, never mutated in place.
//! Builder methods consume `self` and return a new value.
//!
//! Static codes and messages use `Cow<'static, str>` so the common case
//! allocates nothing.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kinds::{ValidationErrorType, ValidationSeverity, ValidationSource};

/// A single validation failure.
///
/// # Examples
///
/// ```rust,ignore
/// use phoenix_validator::foundation::{ValidationError, ValidationErrorType};
///
/// let error = ValidationError::new(ValidationErrorType::Length, "username", "Too short")
///     .with_code("min_length")
///     .with_details(serde_json::json!({ "min": 3, "actual": 2 }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// What kind of check failed.
    #[serde(rename = "type")]
    pub kind: ValidationErrorType,

    /// How serious the failure is.
    pub severity: ValidationSeverity,

    /// Name of the field the error belongs to. Empty for form-level errors.
    pub field: Cow<'static, str>,

    /// Human-readable message shown next to the field.
    pub message: Cow<'static, str>,

    /// Optional machine-readable code for i18n and programmatic handling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Cow<'static, str>>,

    /// Optional structured details (limits, actual values, server payload).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// When the error was produced.
    pub timestamp: DateTime<Utc>,

    /// Whether the error came from the client or the server.
    pub source: ValidationSource,
}

impl ValidationError {
    /// Creates a client-side error with `Error` severity, stamped now.
    pub fn new(
        kind: ValidationErrorType,
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            kind,
            severity: ValidationSeverity::Error,
            field: field.into(),
            message: message.into(),
            code: None,
            details: None,
            timestamp: Utc::now(),
            source: ValidationSource::Client,
        }
    }

    /// Creates an error reported by the backend.
    pub fn server(
        kind: ValidationErrorType,
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(kind, field, message).with_source(ValidationSource::Server)
    }

    /// Creates the error recorded when a validator fails instead of answering.
    pub fn validator_failed(
        field: impl Into<Cow<'static, str>>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::new(ValidationErrorType::Unknown, field, "Validation could not be completed")
            .with_code("validator_failed")
            .with_details(serde_json::json!({ "reason": reason.to_string() }))
    }

    /// Creates the error recorded when an async validator timed out.
    pub fn timed_out(field: impl Into<Cow<'static, str>>, timeout_ms: u64) -> Self {
        Self::new(ValidationErrorType::Timeout, field, "Validation timed out")
            .with_code("timeout")
            .with_details(serde_json::json!({ "timeoutMs": timeout_ms }))
    }

    /// Creates a form-level error (no field).
    pub fn global(kind: ValidationErrorType, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(kind, "", message)
    }

    /// Sets the severity.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_severity(mut self, severity: ValidationSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the field name.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
        self.field = field.into();
        self
    }

    /// Sets the error code.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches structured details.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the source.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_source(mut self, source: ValidationSource) -> Self {
        self.source = source;
        self
    }

    /// Overrides the timestamp.
    #[must_use = "builder methods must be chained or built"]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the explicit code, or the error type's name.
    #[must_use]
    pub fn code_or_kind(&self) -> &str {
        self.code.as_deref().unwrap_or_else(|| self.kind.as_str())
    }

    /// Returns true if this error blocks validity.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Returns true if this is a form-level error.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.field.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}: {}", self.code_or_kind(), self.message)
        } else {
            write!(f, "[{}] {}: {}", self.field, self.code_or_kind(), self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_round_trip_is_identity() {
        let error = ValidationError::server(ValidationErrorType::Unique, "email", "Already taken")
            .with_severity(ValidationSeverity::Critical)
            .with_code("email_taken")
            .with_details(serde_json::json!({ "suggestion": "alice2@example.com" }));

        let json = serde_json::to_string(&error).unwrap();
        let back: ValidationError = serde_json::from_str(&json).unwrap();

        assert_eq!(back, error);
    }

    #[test]
    fn serializes_with_type_key_and_camel_case() {
        let error = ValidationError::new(ValidationErrorType::Required, "name", "Required");
        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["type"], "required");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["source"], "client");
        assert!(value.get("code").is_none());
    }

    #[test]
    fn parses_server_payload_without_optional_fields() {
        let json = r#"{
            "type": "business",
            "severity": "warning",
            "field": "amount",
            "message": "Unusually large",
            "timestamp": "2026-10-18T08:00:00Z",
            "source": "server"
        }"#;
        let error: ValidationError = serde_json::from_str(json).unwrap();

        assert_eq!(error.kind, ValidationErrorType::Business);
        assert!(!error.is_blocking());
        assert_eq!(error.code_or_kind(), "business");
    }

    #[test]
    fn display_includes_field_and_code() {
        let error = ValidationError::new(ValidationErrorType::Length, "bio", "Too long")
            .with_code("max_length");
        assert_eq!(error.to_string(), "[bio] max_length: Too long");

        let global = ValidationError::global(ValidationErrorType::Business, "Quota reached");
        assert!(global.is_global());
        assert_eq!(global.to_string(), "business: Quota reached");
    }
}
