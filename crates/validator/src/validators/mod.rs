//! Built-in rules
//!
//! Ready-made [`ValidationRule`](crate::rule::ValidationRule) constructors for
//! the checks forms need most often.
//!
//! # Categories
//!
//! - **Presence**: [`required`]
//! - **Length**: [`min_length`], [`max_length`], [`length_range`]
//! - **Pattern**: [`pattern`], [`email`]
//! - **Range**: [`range`], [`one_of`]
//! - **Cross-field**: [`matches_field`], [`required_if`]
//! - **Custom**: [`custom`], [`custom_async`]
//!
//! Every rule except the presence rules accepts a blank value (`null`,
//! empty or whitespace-only string, empty array) so optional fields are not
//! rejected for being empty. Combine with [`required`] to forbid blanks.
//!
//! # Examples
//!
//! ```rust,ignore
//! use phoenix_validator::prelude::*;
//!
//! let username = vec![
//!     required("Username is required"),
//!     length_range(3, 20, "Username must be 3-20 characters"),
//!     pattern(r"^[a-z0-9_]+$", "Lowercase letters, digits and underscores only")?,
//! ];
//! ```

mod dependency;
mod length;
mod pattern;
mod presence;
mod range;

pub use dependency::{matches_field, required_if};
pub use length::{length_range, max_length, min_length};
pub use pattern::{email, pattern};
pub use presence::required;
pub use range::{one_of, range};

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::foundation::{ValidationContext, ValidationErrorType};
use crate::rule::{RuleFailure, ValidationRule};

/// A business rule from a plain predicate.
pub fn custom<F>(message: impl Into<Cow<'static, str>>, predicate: F) -> ValidationRule
where
    F: Fn(&Value, &ValidationContext) -> bool + Send + Sync + 'static,
{
    ValidationRule::new(ValidationErrorType::Business, message, predicate)
}

/// An async business rule, typically a backend lookup.
pub fn custom_async<F, Fut>(message: impl Into<Cow<'static, str>>, predicate: F) -> ValidationRule
where
    F: Fn(Value, Arc<ValidationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, RuleFailure>> + Send + 'static,
{
    ValidationRule::new_async(ValidationErrorType::Business, message, predicate)
}

/// Length of a string in chars, or of an array in items.
pub(crate) fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}
