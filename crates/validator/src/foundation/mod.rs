//! Core validation types
//!
//! This module contains the data every other module builds on:
//!
//! - **Kinds**: [`ValidationStatus`], [`ValidationSeverity`], [`ValidationErrorType`], [`ValidationSource`]
//! - **Errors**: [`ValidationError`]
//! - **Results**: [`ValidationResult`], [`ValidationMetadata`]
//! - **Context**: [`ValidationContext`] for cross-field rules

pub mod context;
pub mod error;
pub mod kinds;
pub mod result;

pub use context::{ValidationContext, ValidationContextBuilder, is_blank};
pub use error::ValidationError;
pub use kinds::{ValidationErrorType, ValidationSeverity, ValidationSource, ValidationStatus};
pub use result::{ValidationMetadata, ValidationResult};
