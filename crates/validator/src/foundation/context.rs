//! Cross-field validation context
//!
//! Rules see the value under validation plus a [`ValidationContext`]: the
//! name of the field, a snapshot of the whole form and whether the pass was
//! started by a submit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only view of the form handed to every rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    /// Field being validated.
    pub field: String,
    /// Current values of every field, in registration order.
    pub form_data: Map<String, Value>,
    /// True when the pass was triggered by a form submission.
    pub is_submitting: bool,
}

impl ValidationContext {
    /// Creates a context for `field` with empty form data.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Returns the current value of another field.
    #[must_use]
    pub fn value_of(&self, field: &str) -> Option<&Value> {
        self.form_data.get(field)
    }

    /// Returns another field's value as a string slice, if it is a string.
    #[must_use]
    pub fn str_of(&self, field: &str) -> Option<&str> {
        self.value_of(field).and_then(Value::as_str)
    }

    /// Returns true if another field holds a non-empty value.
    #[must_use]
    pub fn is_filled(&self, field: &str) -> bool {
        self.value_of(field).is_some_and(|v| !is_blank(v))
    }
}

/// Builder for [`ValidationContext`], mostly used by tests and hosts that
/// validate outside a [`FormValidator`](crate::engine::FormValidator).
#[derive(Debug, Default)]
pub struct ValidationContextBuilder {
    inner: ValidationContext,
}

impl ValidationContextBuilder {
    /// Creates a builder for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            inner: ValidationContext::new(field),
        }
    }

    /// Adds a form value.
    #[must_use = "builder methods must be chained or built"]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.inner.form_data.insert(field.into(), value);
        self
    }

    /// Marks the context as a submit pass.
    #[must_use = "builder methods must be chained or built"]
    pub fn submitting(mut self, is_submitting: bool) -> Self {
        self.inner.is_submitting = is_submitting;
        self
    }

    /// Builds the context.
    pub fn build(self) -> ValidationContext {
        self.inner
    }
}

/// Returns true for `null`, empty strings (after trimming), empty arrays and
/// empty objects.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
