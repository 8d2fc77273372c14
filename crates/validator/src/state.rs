//! Field and form validation state
//!
//! [`FieldValidationState`] is a small state machine:
//!
//! ```text
//! Pending ──begin()──▶ Validating ──complete()──▶ Valid | Invalid | Error
//!    ▲                                                    │
//!    └──────────────────── reset() ◀──────────────────────┘
//! ```
//!
//! Its fields are private; the engine drives transitions and UI code only
//! reads. [`FormValidationState`] derives its status from the fields so the
//! form can never claim to be valid while a field or global error says
//! otherwise.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::foundation::{ValidationError, ValidationResult, ValidationStatus};

// ============================================================================
// FIELD STATE
// ============================================================================

/// Validation state of one field.
///
/// Deserializing rejects a `valid` field that carries errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFieldState")]
pub struct FieldValidationState {
    status: ValidationStatus,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
    touched: bool,
    dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_value: Option<Value>,
    /// Number of the pass allowed to settle the field; 0 when none is running.
    #[serde(skip)]
    pass: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFieldState {
    status: ValidationStatus,
    #[serde(default)]
    errors: Vec<ValidationError>,
    #[serde(default)]
    warnings: Vec<ValidationError>,
    #[serde(default)]
    touched: bool,
    #[serde(default)]
    dirty: bool,
    #[serde(default)]
    validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_value: Option<Value>,
}

impl TryFrom<RawFieldState> for FieldValidationState {
    type Error = String;

    fn try_from(raw: RawFieldState) -> Result<Self, Self::Error> {
        if raw.status == ValidationStatus::Valid && !raw.errors.is_empty() {
            return Err(format!(
                "field is marked valid but carries {} error(s)",
                raw.errors.len()
            ));
        }
        Ok(Self {
            status: raw.status,
            errors: raw.errors,
            warnings: raw.warnings,
            touched: raw.touched,
            dirty: raw.dirty,
            validated_at: raw.validated_at,
            last_value: raw.last_value,
            pass: 0,
        })
    }
}

impl FieldValidationState {
    /// A freshly registered field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn validated_at(&self) -> Option<DateTime<Utc>> {
        self.validated_at
    }

    /// Value seen by the last completed pass.
    pub fn last_value(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    /// First blocking message, the one UI code shows inline.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_ref())
    }

    pub(crate) fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Enters `Validating` for pass `pass`, superseding any pass still
    /// running. Previous errors stay visible until the pass ends.
    pub(crate) fn begin(&mut self, pass: u64) {
        self.pass = pass;
        self.status = ValidationStatus::Validating;
    }

    /// Settles the field from pass `pass` unless a newer pass has begun
    /// since. Returns whether the result was applied.
    pub(crate) fn complete_pass(&mut self, pass: u64, value: Value, result: ValidationResult) -> bool {
        if pass != self.pass {
            return false;
        }
        self.pass = 0;
        self.complete(value, result);
        true
    }

    /// Settles the field from a completed pass.
    pub(crate) fn complete(&mut self, value: Value, result: ValidationResult) {
        self.status = if result.errors.is_empty() {
            ValidationStatus::Valid
        } else if result.has_validator_failure() {
            ValidationStatus::Error
        } else {
            ValidationStatus::Invalid
        };
        self.errors = result.errors;
        self.warnings = result.warnings;
        self.validated_at = Some(Utc::now());
        self.last_value = Some(value);
    }

    /// Replaces errors with ones reported by the server for this field.
    ///
    /// Blocking server errors always make the field `Invalid`. A pass still
    /// running for the field is discarded when it finishes.
    pub(crate) fn apply_server_errors(&mut self, errors: Vec<ValidationError>) {
        let mut result = ValidationResult::valid();
        for error in errors {
            result.push(error);
        }
        let value = self.last_value.take().unwrap_or(Value::Null);
        self.pass = 0;
        self.complete(value, result);
        if !self.errors.is_empty() {
            self.status = ValidationStatus::Invalid;
        }
    }

    /// Back to a pristine `Pending` field.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

// ============================================================================
// FORM STATE
// ============================================================================

/// Aggregate state of a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidationState {
    fields: IndexMap<String, FieldValidationState>,
    global_errors: Vec<ValidationError>,
    is_submitting: bool,
    submit_attempts: u32,
}

impl FormValidationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived form status.
    ///
    /// - `Invalid` if any field is invalid or there are global errors
    /// - else `Error` if any field errored
    /// - else `Validating`, then `Pending`, if any field is in that state
    /// - else `Valid` (every field valid, no global errors)
    pub fn status(&self) -> ValidationStatus {
        let statuses = || self.fields.values().map(FieldValidationState::status);

        if !self.global_errors.is_empty() || statuses().any(|s| s == ValidationStatus::Invalid) {
            ValidationStatus::Invalid
        } else if statuses().any(|s| s == ValidationStatus::Error) {
            ValidationStatus::Error
        } else if statuses().any(|s| s == ValidationStatus::Validating) {
            ValidationStatus::Validating
        } else if statuses().any(|s| s == ValidationStatus::Pending) {
            ValidationStatus::Pending
        } else {
            ValidationStatus::Valid
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status() == ValidationStatus::Valid
    }

    pub fn field(&self, name: &str) -> Option<&FieldValidationState> {
        self.fields.get(name)
    }

    /// Fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValidationState)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn global_errors(&self) -> &[ValidationError] {
        &self.global_errors
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn submit_attempts(&self) -> u32 {
        self.submit_attempts
    }

    /// Every blocking error, fields first in order, then global errors.
    pub fn all_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.fields
            .values()
            .flat_map(|f| f.errors.iter())
            .chain(self.global_errors.iter())
    }

    /// Registers a field; an existing field keeps its state.
    pub(crate) fn register(&mut self, name: impl Into<String>) {
        self.fields.entry(name.into()).or_default();
    }

    pub(crate) fn unregister(&mut self, name: &str) -> Option<FieldValidationState> {
        self.fields.shift_remove(name)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut FieldValidationState> {
        self.fields.get_mut(name)
    }

    pub(crate) fn push_global_error(&mut self, error: ValidationError) {
        self.global_errors.push(error);
    }

    pub(crate) fn clear_global_errors(&mut self) {
        self.global_errors.clear();
    }

    pub(crate) fn start_submit(&mut self) {
        self.is_submitting = true;
        self.submit_attempts = self.submit_attempts.saturating_add(1);
    }

    pub(crate) fn finish_submit(&mut self) {
        self.is_submitting = false;
    }

    pub(crate) fn reset(&mut self) {
        for field in self.fields.values_mut() {
            field.reset();
        }
        self.global_errors.clear();
        self.is_submitting = false;
        self.submit_attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{ValidationErrorType, ValidationSeverity};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn required_error(field: &'static str) -> ValidationError {
        ValidationError::new(ValidationErrorType::Required, field, "required")
    }

    #[test]
    fn new_field_is_pending() {
        let field = FieldValidationState::new();
        assert_eq!(field.status(), ValidationStatus::Pending);
        assert!(!field.touched());
        assert!(!field.dirty());
        assert!(field.validated_at().is_none());
    }

    #[test]
    fn complete_settles_status() {
        let mut field = FieldValidationState::new();
        field.begin(1);
        assert_eq!(field.status(), ValidationStatus::Validating);

        field.complete(json!(""), ValidationResult::from_parts(vec![required_error("a")], vec![]));
        assert_eq!(field.status(), ValidationStatus::Invalid);
        assert_eq!(field.first_message(), Some("required"));
        assert_eq!(field.last_value(), Some(&json!("")));

        field.begin(1);
        field.complete(json!("x"), ValidationResult::valid());
        assert_eq!(field.status(), ValidationStatus::Valid);
        assert!(field.errors().is_empty());
        assert!(field.validated_at().is_some());
    }

    #[test]
    fn validator_failure_settles_as_error() {
        let mut field = FieldValidationState::new();
        field.begin(1);
        field.complete(
            json!("x"),
            ValidationResult::from_parts(vec![ValidationError::validator_failed("a", "boom")], vec![]),
        );
        assert_eq!(field.status(), ValidationStatus::Error);
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let mut field = FieldValidationState::new();
        let mut result = ValidationResult::valid();
        result.push(required_error("a").with_severity(ValidationSeverity::Warning));
        field.complete(json!("x"), result);

        assert_eq!(field.status(), ValidationStatus::Valid);
        assert_eq!(field.warnings().len(), 1);
    }

    #[test]
    fn only_the_latest_pass_settles() {
        let mut field = FieldValidationState::new();
        field.begin(1);
        field.begin(2);

        assert!(field.complete_pass(2, json!("new"), ValidationResult::valid()));
        let stale = ValidationResult::from_parts(vec![required_error("a")], vec![]);
        assert!(!field.complete_pass(1, json!("old"), stale));

        assert_eq!(field.status(), ValidationStatus::Valid);
        assert_eq!(field.last_value(), Some(&json!("new")));
    }

    #[test]
    fn server_errors_always_invalidate() {
        let mut field = FieldValidationState::new();
        field.begin(3);
        field.apply_server_errors(vec![
            ValidationError::server(ValidationErrorType::Network, "a", "Upstream check failed"),
            ValidationError::server(ValidationErrorType::Business, "a", "Looks odd")
                .with_severity(ValidationSeverity::Warning),
        ]);
        assert_eq!(field.status(), ValidationStatus::Invalid);
        assert_eq!(field.errors().len(), 1);
        assert_eq!(field.warnings().len(), 1);

        assert!(!field.complete_pass(3, json!("x"), ValidationResult::valid()));
        assert_eq!(field.status(), ValidationStatus::Invalid);
    }

    #[test]
    fn valid_field_with_errors_does_not_deserialize() {
        let error = serde_json::to_value(required_error("a")).unwrap();
        let bad = json!({ "status": "valid", "errors": [error.clone()], "warnings": [], "touched": true, "dirty": true });
        assert!(serde_json::from_value::<FieldValidationState>(bad).is_err());

        let ok = json!({ "status": "invalid", "errors": [error], "warnings": [], "touched": true, "dirty": true });
        let field: FieldValidationState = serde_json::from_value(ok).unwrap();
        assert_eq!(field.status(), ValidationStatus::Invalid);
    }

    #[test]
    fn form_state_round_trips_through_json() {
        let mut form = FormValidationState::new();
        form.register("a");
        form.field_mut("a").unwrap().complete(json!(""), ValidationResult::from_parts(vec![required_error("a")], vec![]));
        let back: FormValidationState = serde_json::from_value(serde_json::to_value(&form).unwrap()).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn empty_form_is_valid_until_global_error() {
        let mut form = FormValidationState::new();
        assert_eq!(form.status(), ValidationStatus::Valid);

        form.push_global_error(ValidationError::global(ValidationErrorType::Business, "nope"));
        assert_eq!(form.status(), ValidationStatus::Invalid);

        form.clear_global_errors();
        assert!(form.is_valid());
    }

    #[test]
    fn form_status_precedence() {
        let mut form = FormValidationState::new();
        form.register("a");
        form.register("b");
        assert_eq!(form.status(), ValidationStatus::Pending);

        form.field_mut("a").unwrap().complete(json!(1), ValidationResult::valid());
        form.field_mut("b").unwrap().begin(1);
        assert_eq!(form.status(), ValidationStatus::Validating);

        form.field_mut("b").unwrap().complete(
            json!(1),
            ValidationResult::from_parts(vec![ValidationError::timed_out("b", 10)], vec![]),
        );
        assert_eq!(form.status(), ValidationStatus::Error);

        form.register("c");
        form.field_mut("c")
            .unwrap()
            .complete(json!(""), ValidationResult::from_parts(vec![required_error("c")], vec![]));
        assert_eq!(form.status(), ValidationStatus::Invalid);
        assert_eq!(form.field_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn submit_counters() {
        let mut form = FormValidationState::new();
        form.start_submit();
        assert!(form.is_submitting());
        form.finish_submit();
        form.start_submit();
        form.finish_submit();
        assert!(!form.is_submitting());
        assert_eq!(form.submit_attempts(), 2);

        form.reset();
        assert_eq!(form.submit_attempts(), 0);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Begin(usize),
        Pass(usize),
        Fail(usize),
        Crash(usize),
        Global,
        ClearGlobal,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..4usize).prop_map(Step::Begin),
            (0..4usize).prop_map(Step::Pass),
            (0..4usize).prop_map(Step::Fail),
            (0..4usize).prop_map(Step::Crash),
            Just(Step::Global),
            Just(Step::ClearGlobal),
        ]
    }

    proptest! {
        #[test]
        fn form_validity_invariant_holds(steps in prop::collection::vec(step(), 0..40)) {
            let names = ["a", "b", "c", "d"];
            let mut form = FormValidationState::new();
            for name in names {
                form.register(name);
            }

            for step in steps {
                match step {
                    Step::Begin(i) => form.field_mut(names[i]).unwrap().begin(1),
                    Step::Pass(i) => form.field_mut(names[i]).unwrap().complete(json!(i), ValidationResult::valid()),
                    Step::Fail(i) => form.field_mut(names[i]).unwrap().complete(
                        json!(i),
                        ValidationResult::from_parts(vec![required_error("x")], vec![]),
                    ),
                    Step::Crash(i) => form.field_mut(names[i]).unwrap().complete(
                        json!(i),
                        ValidationResult::from_parts(vec![ValidationError::validator_failed("x", "boom")], vec![]),
                    ),
                    Step::Global => form.push_global_error(ValidationError::global(ValidationErrorType::Business, "g")),
                    Step::ClearGlobal => form.clear_global_errors(),
                }

                for (_, field) in form.fields() {
                    prop_assert!(!(field.status() == ValidationStatus::Valid && !field.errors().is_empty()));
                }

                let any_invalid = form.fields().any(|(_, f)| f.status() == ValidationStatus::Invalid);
                let all_valid = form.fields().all(|(_, f)| f.status() == ValidationStatus::Valid);
                if any_invalid {
                    prop_assert_eq!(form.status(), ValidationStatus::Invalid);
                }
                prop_assert_eq!(form.is_valid(), all_valid && form.global_errors().is_empty());
            }
        }
    }
}
