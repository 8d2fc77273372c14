//! Presence rules

use std::borrow::Cow;

use crate::foundation::{ValidationErrorType, is_blank};
use crate::rule::ValidationRule;

/// Rejects `null`, blank strings, empty arrays and empty objects.
pub fn required(message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Required, message, |value, _| !is_blank(value))
        .with_code("required")
}
