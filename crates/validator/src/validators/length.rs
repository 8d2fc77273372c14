//! Length rules
//!
//! Length is counted in Unicode scalar values for strings and in items for
//! arrays. Values of other types are rejected.

use std::borrow::Cow;

use serde_json::json;

use super::measure;
use crate::foundation::{ValidationErrorType, is_blank};
use crate::rule::ValidationRule;

/// At least `min` characters or items.
pub fn min_length(min: usize, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Length, message, move |value, _| {
        is_blank(value) || measure(value).is_some_and(|len| len >= min)
    })
    .with_code("min_length")
    .with_details(json!({ "min": min }))
}

/// At most `max` characters or items.
pub fn max_length(max: usize, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Length, message, move |value, _| {
        is_blank(value) || measure(value).is_some_and(|len| len <= max)
    })
    .with_code("max_length")
    .with_details(json!({ "max": max }))
}

/// Between `min` and `max` characters or items, inclusive.
pub fn length_range(min: usize, max: usize, message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Length, message, move |value, _| {
        is_blank(value) || measure(value).is_some_and(|len| (min..=max).contains(&len))
    })
    .with_code("length_range")
    .with_details(json!({ "min": min, "max": max }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ValidationContext;
    use serde_json::Value;

    fn check(rule: &ValidationRule, value: Value) -> bool {
        rule.evaluate_sync(&value, &ValidationContext::new("f"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn min_length_counts_chars() {
        let rule = min_length(3, "too short");
        assert!(check(&rule, json!("abc")));
        assert!(check(&rule, json!("日本語")));
        assert!(!check(&rule, json!("ab")));
        assert!(check(&rule, json!("")));
        assert!(!check(&rule, json!(123)));
    }

    #[test]
    fn max_length_counts_items() {
        let rule = max_length(2, "too many");
        assert!(check(&rule, json!(["a", "b"])));
        assert!(!check(&rule, json!(["a", "b", "c"])));
    }

    #[test]
    fn length_range_bounds_inclusive() {
        let rule = length_range(2, 4, "2-4");
        assert!(!check(&rule, json!("a")));
        assert!(check(&rule, json!("ab")));
        assert!(check(&rule, json!("abcd")));
        assert!(!check(&rule, json!("abcde")));
        assert_eq!(rule.violation("f").code.as_deref(), Some("length_range"));
    }
}
