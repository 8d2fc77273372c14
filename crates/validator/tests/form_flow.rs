//! End-to-end form scenarios driven through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use phoenix_validator::prelude::*;
use pretty_assertions::assert_eq;

fn registration_form(strategy: ValidationStrategy) -> FormValidator {
    phoenix_log::init_test();
    let form = FormValidator::new(strategy);
    form.register_field(
        "email",
        vec![required("Email is required"), email("Enter a valid email address")],
    );
    form.register_field(
        "password",
        vec![
            required("Password is required"),
            min_length(8, "At least 8 characters"),
            pattern(r"[0-9]", "Include a digit")
                .unwrap()
                .with_severity(ValidationSeverity::Warning),
        ],
    );
    form.register_field(
        "confirm",
        vec![required("Confirm your password"), matches_field("password", "Passwords do not match")],
    );
    form.register_field("age", vec![range(18.0, 130.0, "You must be an adult")]);
    form
}

// ============================================================================
// SUBMIT
// ============================================================================

#[tokio::test]
async fn empty_form_fails_submit_with_required_errors() {
    let form = registration_form(ValidationStrategy::on_submit());
    let outcome = form.submit().await;

    assert_eq!(outcome.status, ValidationStatus::Invalid);
    let fields: Vec<&str> = outcome.errors.iter().map(|e| &*e.field).collect();
    assert_eq!(fields, vec!["email", "password", "confirm"]);
    assert!(outcome.errors.iter().all(|e| e.kind == ValidationErrorType::Required));
}

#[tokio::test]
async fn filled_form_submits_with_warning() {
    let form = registration_form(ValidationStrategy::on_submit());
    form.handle_change("email", json!("dev@phoenix.io")).unwrap();
    form.handle_change("password", json!("longpassword")).unwrap();
    form.handle_change("confirm", json!("longpassword")).unwrap();
    form.handle_change("age", json!("42")).unwrap();

    let outcome = form.submit().await;
    assert!(outcome.is_valid(), "unexpected errors: {:?}", outcome.errors);

    let password = form.field_state("password").unwrap();
    assert_eq!(password.status(), ValidationStatus::Valid);
    assert_eq!(password.warnings().len(), 1);
    assert_eq!(password.warnings()[0].message, "Include a digit");
}

#[tokio::test]
async fn fixing_errors_between_submits() {
    let form = registration_form(ValidationStrategy::on_submit());
    form.handle_change("email", json!("not-an-email")).unwrap();
    form.handle_change("password", json!("short")).unwrap();
    form.handle_change("confirm", json!("other")).unwrap();

    let first = form.submit().await;
    assert_eq!(first.attempt, 1);
    assert_eq!(
        form.field_state("email").unwrap().first_message(),
        Some("Enter a valid email address")
    );
    assert_eq!(
        form.field_state("confirm").unwrap().first_message(),
        Some("Passwords do not match")
    );

    form.handle_change("email", json!("dev@phoenix.io")).unwrap();
    form.handle_change("password", json!("s3cure-password")).unwrap();
    form.handle_change("confirm", json!("s3cure-password")).unwrap();
    let second = form.submit().await;
    assert_eq!(second.attempt, 2);
    assert!(second.is_valid());
    assert_eq!(form.snapshot().submit_attempts(), 2);
}

#[tokio::test]
async fn optional_field_accepts_blank_but_rejects_out_of_range() {
    let form = registration_form(ValidationStrategy::on_submit());
    let blank = form.validate_field("age", json!("")).await.unwrap();
    assert!(blank.result().unwrap().is_valid);

    let young = form.validate_field("age", json!(12)).await.unwrap();
    assert_eq!(young.result().unwrap().errors[0].kind, ValidationErrorType::Range);
}

// ============================================================================
// ASYNC RULES
// ============================================================================

#[tokio::test(start_paused = true)]
async fn username_availability_is_debounced() {
    let lookups = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&lookups);
    let form = FormValidator::new(ValidationStrategy::eager());
    form.register_field(
        "username",
        vec![
            required("Required"),
            ValidationRule::new_async(ValidationErrorType::Unique, "Username is taken", move |value, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(value != json!("admin")) }
            }),
        ],
    );

    for partial in ["a", "ad", "adm", "admi", "admin"] {
        form.handle_change("username", json!(partial)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(lookups.load(Ordering::SeqCst), 1);
    let state = form.field_state("username").unwrap();
    assert_eq!(state.status(), ValidationStatus::Invalid);
    assert_eq!(state.errors()[0].kind, ValidationErrorType::Unique);
}

#[tokio::test(start_paused = true)]
async fn slow_backend_settles_as_error_not_invalid() {
    let form = FormValidator::new(
        ValidationStrategy::on_blur().with_timeout(Some(Duration::from_millis(500))),
    );
    form.register_field(
        "email",
        vec![custom_async("Email already registered", |_, _| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(true)
        })],
    );

    form.handle_change("email", json!("dev@phoenix.io")).unwrap();
    form.handle_blur("email").await.unwrap();

    let state = form.field_state("email").unwrap();
    assert_eq!(state.status(), ValidationStatus::Error);
    assert_eq!(state.errors()[0].kind, ValidationErrorType::Timeout);
    assert_eq!(form.status(), ValidationStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn network_failure_recovers_on_retry() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let form = FormValidator::new(
        ValidationStrategy::on_blur().with_retry(RetryConfig::exponential(3, Duration::from_millis(100))),
    );
    form.register_field(
        "email",
        vec![custom_async("Email already registered", move |_, _| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RuleFailure::Network("connection reset".into()))
                } else {
                    Ok(true)
                }
            }
        })],
    );

    let outcome = form.validate_field("email", json!("dev@phoenix.io")).await.unwrap();
    let result = outcome.result().unwrap();
    assert!(result.is_valid);
    assert_eq!(result.metadata.as_ref().unwrap().retries, 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

// ============================================================================
// EXCEPTION STATES
// ============================================================================

#[tokio::test]
async fn maintenance_skips_submit_validation() {
    let form = registration_form(ValidationStrategy::on_submit());
    form.enter_exception(FrontendExceptionState::ServerMaintenance);

    let outcome = form.submit().await;
    assert_eq!(outcome.skipped.len(), 4);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.status, ValidationStatus::Pending);
    assert!(!outcome.is_valid());
}

#[tokio::test]
async fn scoped_skip_only_affects_listed_fields() {
    let config = ExceptionStateConfig::new().with(
        FrontendExceptionState::ValidationServiceUnavailable,
        ExceptionHandlingStrategy::skip("Availability check is down").for_fields(["email"]),
    );
    let form = FormValidator::with_exception_config(ValidationStrategy::on_submit(), config);
    form.register_field("email", vec![required("Required")]);
    form.register_field("name", vec![required("Required")]);
    form.enter_exception(FrontendExceptionState::ValidationServiceUnavailable);

    let outcome = form.submit().await;
    assert_eq!(
        outcome.skipped,
        vec![("email".to_string(), FrontendExceptionState::ValidationServiceUnavailable)]
    );
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field, "name");
}

#[tokio::test]
async fn global_errors_block_an_otherwise_valid_form() {
    let form = FormValidator::new(ValidationStrategy::on_submit());
    form.register_field("name", vec![required("Required")]);
    form.handle_change("name", json!("Ada")).unwrap();
    assert!(form.submit().await.is_valid());

    form.add_global_error(ValidationError::global(
        ValidationErrorType::Business,
        "Registration is closed",
    ));
    assert_eq!(form.status(), ValidationStatus::Invalid);
    form.clear_global_errors();
    assert_eq!(form.status(), ValidationStatus::Valid);
}
