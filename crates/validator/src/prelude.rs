//! Prelude module for convenient imports.
//!
//! Provides a single `use phoenix_validator::prelude::*;` import that brings
//! in the engine, the state model, the strategy types and every built-in
//! rule.
//!
//! # Examples
//!
//! ```rust,ignore
//! use phoenix_validator::prelude::*;
//!
//! let form = FormValidator::new(ValidationStrategy::on_blur());
//! form.register_field("age", vec![required("Age is required"), range(18.0, 120.0, "18 to 120")]);
//! ```

// ============================================================================
// FOUNDATION: statuses, errors, results, context
// ============================================================================

pub use crate::foundation::{
    ValidationContext, ValidationContextBuilder, ValidationError, ValidationErrorType,
    ValidationMetadata, ValidationResult, ValidationSeverity, ValidationSource, ValidationStatus,
    is_blank,
};

// ============================================================================
// STATE, RULES, STRATEGY
// ============================================================================

pub use crate::exception::{
    ActiveExceptions, ExceptionHandlingStrategy, ExceptionStateConfig, FrontendExceptionState,
};
pub use crate::rule::{RuleFailure, ValidationRule};
pub use crate::state::{FieldValidationState, FormValidationState};
pub use crate::strategy::{AsyncValidationConfig, RetryConfig, ValidationStrategy, ValidationTrigger};

// ============================================================================
// ENGINE
// ============================================================================

pub use crate::engine::{EngineError, FieldOutcome, FormValidator, SubmitOutcome};

// ============================================================================
// VALIDATORS: all built-in rules
// ============================================================================

#[allow(clippy::wildcard_imports)]
pub use crate::validators::*;

pub use serde_json::json;
