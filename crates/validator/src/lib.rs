//! # phoenix-validator
//!
//! Form validation for PhoenixCoder clients: per-field and per-form
//! validation state, ordered rule lists, validation strategies (when to
//! validate, debounce, retry) and the exception-state table that switches
//! validation behavior while the client is offline, rate limited, and so on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phoenix_validator::prelude::*;
//!
//! let form = FormValidator::new(ValidationStrategy::eager());
//! form.register_field("username", vec![required("Username is required"), min_length(3, "Too short")]);
//!
//! let outcome = form.validate_field("username", json!("al")).await;
//! assert_eq!(form.field_state("username").unwrap().status(), ValidationStatus::Invalid);
//! ```
//!
//! ## Layout
//!
//! - [`foundation`]: statuses, severities, error types, [`ValidationError`](foundation::ValidationError),
//!   [`ValidationResult`](foundation::ValidationResult), [`ValidationContext`](foundation::ValidationContext)
//! - [`state`]: [`FieldValidationState`](state::FieldValidationState) and
//!   [`FormValidationState`](state::FormValidationState)
//! - [`rule`]: [`ValidationRule`](rule::ValidationRule) and rule evaluation
//! - [`validators`]: built-in rules (`required`, `min_length`, `pattern`, ...)
//! - [`strategy`]: triggers, debounce, [`RetryConfig`](strategy::RetryConfig)
//! - [`exception`]: frontend exception states and their handling strategies
//! - [`engine`]: [`FormValidator`](engine::FormValidator), the component driving all of the above

pub mod engine;
pub mod exception;
pub mod foundation;
pub mod prelude;
pub mod rule;
pub mod state;
pub mod strategy;
pub mod validators;
