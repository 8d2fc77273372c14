//! Enumerations shared by every validation type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a field or form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Registered, never validated.
    #[default]
    Pending,
    /// A validation pass is running.
    Validating,
    /// Last pass produced no errors.
    Valid,
    /// Last pass produced at least one rule violation.
    Invalid,
    /// Last pass could not decide because a validator failed.
    Error,
}

impl ValidationStatus {
    /// Returns true for `Valid`, `Invalid` and `Error`.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Valid | Self::Invalid | Self::Error)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Severity level of a validation error.
///
/// `Info` and `Warning` are advisory: they are reported as warnings and never
/// make a field invalid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    /// Informational message.
    Info,
    /// Should be addressed but doesn't block.
    Warning,
    /// Must be fixed (default).
    #[default]
    Error,
    /// Must be fixed; also flags the field for attention.
    Critical,
}

impl ValidationSeverity {
    /// Returns true if an error of this severity blocks validity.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

/// What kind of check produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationErrorType {
    Required,
    Format,
    Length,
    Range,
    Pattern,
    Unique,
    Dependency,
    Business,
    Network,
    Permission,
    Timeout,
    Unknown,
}

impl ValidationErrorType {
    /// Returns true for error types raised when the validator itself failed
    /// rather than when the value was rejected.
    #[must_use]
    pub fn is_validator_failure(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Unknown)
    }

    /// Stable lowercase code used as the default error code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Format => "format",
            Self::Length => "length",
            Self::Range => "range",
            Self::Pattern => "pattern",
            Self::Unique => "unique",
            Self::Dependency => "dependency",
            Self::Business => "business",
            Self::Network => "network",
            Self::Permission => "permission",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an error was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSource {
    /// Local rule evaluation.
    #[default]
    Client,
    /// Returned by the backend.
    Server,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ValidationStatus::Validating).unwrap();
        assert_eq!(json, "\"validating\"");
        assert_eq!(ValidationStatus::Invalid.to_string(), "invalid");
    }

    #[test]
    fn severity_blocking() {
        assert!(!ValidationSeverity::Info.is_blocking());
        assert!(!ValidationSeverity::Warning.is_blocking());
        assert!(ValidationSeverity::Error.is_blocking());
        assert!(ValidationSeverity::Critical.is_blocking());
    }

    #[test]
    fn validator_failure_types() {
        assert!(ValidationErrorType::Timeout.is_validator_failure());
        assert!(ValidationErrorType::Unknown.is_validator_failure());
        assert!(!ValidationErrorType::Required.is_validator_failure());
        assert_eq!(
            serde_json::to_value(ValidationErrorType::Dependency).unwrap(),
            serde_json::json!("dependency")
        );
    }
}
