//! Outcome of one validation pass

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Result of evaluating a field's rules once.
///
/// `is_valid` is kept equal to `errors.is_empty()` by every constructor and
/// by [`push`](Self::push).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ValidationMetadata>,
}

/// Diagnostics attached to a [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetadata {
    /// Field the pass ran for.
    pub field: String,
    /// Wall time of the pass.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Rules evaluated before the pass stopped.
    pub rules_evaluated: usize,
    /// Retries spent on async rules (0 when none were needed).
    pub retries: u32,
}

impl ValidationResult {
    /// A passing result with no diagnostics.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: None,
        }
    }

    /// Builds a result from collected errors and warnings.
    #[must_use]
    pub fn from_parts(errors: Vec<ValidationError>, warnings: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            metadata: None,
        }
    }

    /// Records an error, routing advisory severities to `warnings`.
    pub fn push(&mut self, error: ValidationError) {
        if error.is_blocking() {
            self.errors.push(error);
            self.is_valid = false;
        } else {
            self.warnings.push(error);
        }
    }

    /// Attaches diagnostics.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ValidationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns true if any error came from a failing validator rather than
    /// a rejected value.
    #[must_use]
    pub fn has_validator_failure(&self) -> bool {
        self.errors.iter().any(|e| e.kind.is_validator_failure())
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

pub(crate) mod duration_ms {
    //! Serializes a `Duration` as whole milliseconds.

    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

pub(crate) mod option_duration_ms {
    //! Serializes an `Option<Duration>` as whole milliseconds or `null`.

    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
