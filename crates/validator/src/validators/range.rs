//! Numeric range and enumeration rules

use std::borrow::Cow;

use serde_json::{Value, json};

use crate::foundation::{ValidationErrorType, is_blank};
use crate::rule::ValidationRule;

/// Numbers within `min..=max`. Numeric strings are parsed.
pub fn range(min: f64, max: f64, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Range, message, move |value, _| {
        is_blank(value) || as_number(value).is_some_and(|n| n >= min && n <= max)
    })
    .with_code("range")
    .with_details(json!({ "min": min, "max": max }))
}

/// One of the listed values.
pub fn one_of(allowed: Vec<Value>, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    let details = json!({ "allowed": allowed.clone() });
    ValidationRule::new(ValidationErrorType::Range, message, move |value, _| {
        is_blank(value) || allowed.contains(value)
    })
    .with_code("one_of")
    .with_details(details)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
