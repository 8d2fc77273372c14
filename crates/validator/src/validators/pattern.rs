//! Pattern rules

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::foundation::{ValidationErrorType, is_blank};
use crate::rule::ValidationRule;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Strings matching `regex`. Fails to build if the pattern does not compile.
pub fn pattern(
    regex: &str,
    message: impl Into<Cow<'static, str>>,
) -> Result<ValidationRule, regex::Error> {
    let compiled = Regex::new(regex)?;
    Ok(
        ValidationRule::new(ValidationErrorType::Pattern, message, move |value, _| {
            matches_regex(&compiled, value)
        })
        .with_code("pattern")
        .with_details(json!({ "pattern": regex })),
    )
}

/// A plausible e-mail address (`local@domain.tld`).
pub fn email(message: impl Into<Cow<'static, str>>) -> ValidationRule {
    ValidationRule::new(ValidationErrorType::Format, message, |value, _| {
        matches_regex(&EMAIL, value)
    })
    .with_code("email")
}

fn matches_regex(regex: &Regex, value: &Value) -> bool {
    is_blank(value) || value.as_str().is_some_and(|s| regex.is_match(s))
}
