//! Cross-field rules
//!
//! These read other fields through the [`ValidationContext`] and declare
//! them as dependencies so the engine re-validates this field when they
//! change.

use std::borrow::Cow;

use serde_json::json;

use crate::foundation::{ValidationContext, ValidationErrorType, is_blank};
use crate::rule::ValidationRule;

/// Equal to the current value of `other` (password confirmation).
pub fn matches_field(other: impl Into<String>, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    let other = other.into();
    let details = json!({ "field": other.clone() });
    let target = other.clone();
    ValidationRule::new(
        ValidationErrorType::Dependency,
        message,
        move |value, ctx: &ValidationContext| {
            is_blank(value) || ctx.value_of(&target) == Some(value)
        },
    )
    .with_code("matches_field")
    .with_details(details)
    .depends_on(other)
}

/// Required while `other` holds a non-blank value.
pub fn required_if(other: impl Into<String>, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    let other = other.into();
    let target = other.clone();
    ValidationRule::new(
        ValidationErrorType::Dependency,
        message,
        move |value, ctx: &ValidationContext| !ctx.is_filled(&target) || !is_blank(value),
    )
    .with_code("required_if")
    .depends_on(other)
}
