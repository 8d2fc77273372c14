//! Validation engine
//!
//! [`FormValidator`] drives the validation model: it owns the rule table,
//! the strategy, the exception configuration with the currently active
//! exception states, the form data and the [`FormValidationState`].
//!
//! The validator is a cheap handle (`Clone` shares the same form). Debounced
//! passes run on tokio tasks holding a weak reference, so dropping the last
//! handle cancels everything that is still pending.
//!
//! ```rust,ignore
//! use phoenix_validator::prelude::*;
//!
//! let form = FormValidator::new(ValidationStrategy::eager());
//! form.register_field("email", vec![required("Email is required"), email("Invalid email")]);
//! form.handle_change("email", json!("someone@example.com"))?;
//! let outcome = form.submit().await;
//! assert!(outcome.is_valid());
//! ```

pub mod debounce;
mod evaluate;
pub mod retry;

pub use debounce::{Debouncer, NoRuntime};
pub use retry::{RetryError, RetryOutcome, RetryPolicy, retry};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::exception::{ActiveExceptions, ExceptionStateConfig, FrontendExceptionState};
use crate::foundation::{ValidationContext, ValidationError, ValidationResult, ValidationStatus};
use crate::rule::ValidationRule;
use crate::state::{FieldValidationState, FormValidationState};
use crate::strategy::{ValidationStrategy, ValidationTrigger};

/// Errors returned by [`FormValidator`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("field `{0}` is not registered")]
    UnknownField(String),

    #[error(transparent)]
    NoRuntime(#[from] NoRuntime),
}

/// What happened to a single field pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// Rules ran; the field state was updated.
    Validated(ValidationResult),
    /// An active exception state suppressed the pass; the field state is untouched.
    Skipped(FrontendExceptionState),
    /// A newer pass, a reset or server errors took over the field before
    /// this pass finished. Its result was dropped.
    Superseded,
}

impl FieldOutcome {
    pub fn result(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validated(result) => Some(result),
            Self::Skipped(_) | Self::Superseded => None,
        }
    }
}

/// Summary of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub status: ValidationStatus,
    pub attempt: u32,
    pub errors: Vec<ValidationError>,
    pub skipped: Vec<(String, FrontendExceptionState)>,
}

impl SubmitOutcome {
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

#[derive(Debug)]
struct Inner {
    strategy: ValidationStrategy,
    exceptions: ExceptionStateConfig,
    rules: RwLock<IndexMap<String, Arc<[ValidationRule]>>>,
    values: Mutex<Map<String, Value>>,
    state: Mutex<FormValidationState>,
    active: Mutex<ActiveExceptions>,
    debouncer: Debouncer,
    next_pass: AtomicU64,
}

/// Validates the fields of one form.
#[derive(Debug, Clone)]
pub struct FormValidator {
    inner: Arc<Inner>,
}

impl FormValidator {
    /// Creates a validator with the default exception configuration.
    pub fn new(strategy: ValidationStrategy) -> Self {
        Self::with_exception_config(strategy, ExceptionStateConfig::default())
    }

    pub fn with_exception_config(strategy: ValidationStrategy, exceptions: ExceptionStateConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                strategy,
                exceptions,
                rules: RwLock::new(IndexMap::new()),
                values: Mutex::new(Map::new()),
                state: Mutex::new(FormValidationState::new()),
                active: Mutex::new(ActiveExceptions::new()),
                debouncer: Debouncer::new(),
                next_pass: AtomicU64::new(0),
            }),
        }
    }

    pub fn strategy(&self) -> &ValidationStrategy {
        &self.inner.strategy
    }

    pub fn exception_config(&self) -> &ExceptionStateConfig {
        &self.inner.exceptions
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    /// Registers `name` with its rules. Registering again replaces the rules
    /// and keeps the field's state.
    pub fn register_field(&self, name: impl Into<String>, rules: Vec<ValidationRule>) {
        let name = name.into();
        self.inner.state.lock().register(name.clone());
        self.inner.values.lock().entry(name.clone()).or_insert(Value::Null);
        tracing::debug!(field = %name, rules = rules.len(), "field registered");
        self.inner.rules.write().insert(name, rules.into());
    }

    /// Removes a field, its value, its state and any pending pass.
    pub fn unregister_field(&self, name: &str) -> bool {
        self.inner.debouncer.cancel(name);
        self.inner.values.lock().remove(name);
        self.inner.state.lock().unregister(name);
        self.inner.rules.write().shift_remove(name).is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.rules.read().contains_key(name)
    }

    /// Current value of a field in the form data.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.inner.values.lock().get(name).cloned()
    }

    // ------------------------------------------------------------------------
    // UI events
    // ------------------------------------------------------------------------

    /// Records a new value. Schedules a debounced pass when `OnChange` is a
    /// trigger, plus passes for already validated dependents.
    ///
    /// Must be called from inside a tokio runtime when a pass gets scheduled.
    pub fn handle_change(&self, name: &str, value: Value) -> Result<(), EngineError> {
        let rules = self.rules(name)?;
        self.inner.values.lock().insert(name.to_string(), value.clone());
        if let Some(field) = self.inner.state.lock().field_mut(name) {
            field.mark_dirty();
        }

        let strategy = &self.inner.strategy;
        if strategy.triggers_on(ValidationTrigger::OnChange) {
            self.schedule(name, value, self.debounce_for(&rules))?;
        }
        if strategy.validate_dependents {
            for (dependent, rules) in self.dependents_of(name) {
                let value = self.value(&dependent).unwrap_or(Value::Null);
                tracing::trace!(field = name, %dependent, "re-validating dependent");
                self.schedule(&dependent, value, self.debounce_for(&rules))?;
            }
        }
        Ok(())
    }

    /// Marks the field touched and validates it now when `OnBlur` is a
    /// trigger. A pending debounced pass for the field is replaced.
    pub async fn handle_blur(&self, name: &str) -> Result<Option<FieldOutcome>, EngineError> {
        let _ = self.rules(name)?;
        if let Some(field) = self.inner.state.lock().field_mut(name) {
            field.mark_touched();
        }
        if !self.inner.strategy.triggers_on(ValidationTrigger::OnBlur) {
            return Ok(None);
        }
        self.inner.debouncer.cancel(name);
        let value = self.value(name).unwrap_or(Value::Null);
        self.run_pass(name, value, false).await.map(Some)
    }

    /// Stores `value` and validates the field immediately.
    pub async fn validate_field(&self, name: &str, value: Value) -> Result<FieldOutcome, EngineError> {
        let _ = self.rules(name)?;
        self.inner.values.lock().insert(name.to_string(), value.clone());
        self.inner.debouncer.cancel(name);
        self.run_pass(name, value, false).await
    }

    /// Validates every registered field with its current value.
    pub async fn validate_all(&self) -> Vec<(String, FieldOutcome)> {
        self.validate_every_field(false).await
    }

    /// Runs the on-mount pass if the strategy asks for one.
    pub async fn mount(&self) -> Option<Vec<(String, FieldOutcome)>> {
        if !self.inner.strategy.async_validation.validate_on_mount {
            return None;
        }
        Some(self.validate_every_field(false).await)
    }

    /// Validates the whole form for submission.
    pub async fn submit(&self) -> SubmitOutcome {
        self.inner.debouncer.cancel_all();
        let attempt = {
            let mut state = self.inner.state.lock();
            state.start_submit();
            state.submit_attempts()
        };
        tracing::info!(attempt, "form submit started");

        let skipped = self
            .validate_every_field(true)
            .await
            .into_iter()
            .filter_map(|(name, outcome)| match outcome {
                FieldOutcome::Skipped(state) => Some((name, state)),
                FieldOutcome::Validated(_) | FieldOutcome::Superseded => None,
            })
            .collect();

        let mut state = self.inner.state.lock();
        state.finish_submit();
        let outcome = SubmitOutcome {
            status: state.status(),
            attempt,
            errors: state.all_errors().cloned().collect(),
            skipped,
        };
        drop(state);

        tracing::info!(
            attempt,
            status = %outcome.status,
            errors = outcome.errors.len(),
            skipped = outcome.skipped.len(),
            "form submit finished"
        );
        outcome
    }

    // ------------------------------------------------------------------------
    // Errors from outside the rules
    // ------------------------------------------------------------------------

    pub fn add_global_error(&self, error: ValidationError) {
        tracing::debug!(kind = %error.kind, "global error added: {}", error.message);
        self.inner.state.lock().push_global_error(error);
    }

    pub fn clear_global_errors(&self) {
        self.inner.state.lock().clear_global_errors();
    }

    /// Attaches server-reported errors to their fields. Errors without a
    /// field, or for an unknown field, become global errors.
    pub fn apply_server_errors(&self, errors: Vec<ValidationError>) {
        let mut by_field: IndexMap<String, Vec<ValidationError>> = IndexMap::new();
        let mut state = self.inner.state.lock();
        for error in errors {
            if !error.is_global() && state.field(&error.field).is_some() {
                by_field.entry(error.field.to_string()).or_default().push(error);
            } else {
                state.push_global_error(error);
            }
        }
        for (name, errors) in by_field {
            if let Some(field) = state.field_mut(&name) {
                field.apply_server_errors(errors);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Exception states
    // ------------------------------------------------------------------------

    /// Activates an exception state. Returns false if it was already active.
    pub fn enter_exception(&self, state: FrontendExceptionState) -> bool {
        let entered = self.inner.active.lock().enter(state);
        if entered {
            tracing::info!(%state, "exception state entered");
        }
        entered
    }

    pub fn leave_exception(&self, state: FrontendExceptionState) -> bool {
        let left = self.inner.active.lock().leave(state);
        if left {
            tracing::info!(%state, "exception state left");
        }
        left
    }

    pub fn active_exceptions(&self) -> ActiveExceptions {
        self.inner.active.lock().clone()
    }

    /// Message to show while an active exception state wants fallback UI.
    pub fn fallback_message(&self) -> Option<String> {
        self.inner
            .active
            .lock()
            .fallback_message(&self.inner.exceptions)
            .map(str::to_string)
    }

    /// True while an active exception state enables offline mode.
    pub fn is_offline_mode(&self) -> bool {
        let active = self.inner.active.lock();
        active
            .iter()
            .any(|state| self.inner.exceptions.get(state).enable_offline_mode)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// A copy of the current form state.
    pub fn snapshot(&self) -> FormValidationState {
        self.inner.state.lock().clone()
    }

    pub fn field_state(&self, name: &str) -> Option<FieldValidationState> {
        self.inner.state.lock().field(name).cloned()
    }

    pub fn status(&self) -> ValidationStatus {
        self.inner.state.lock().status()
    }

    /// Number of debounced passes waiting to run.
    pub fn pending_validations(&self) -> usize {
        self.inner.debouncer.pending()
    }

    /// Cancels pending passes and returns every field to `Pending`. Values
    /// and rules are kept.
    pub fn reset(&self) {
        self.inner.debouncer.cancel_all();
        self.inner.state.lock().reset();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn rules(&self, name: &str) -> Result<Arc<[ValidationRule]>, EngineError> {
        self.inner
            .rules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownField(name.to_string()))
    }

    /// Fields with a rule depending on `name` that have already been validated.
    fn dependents_of(&self, name: &str) -> Vec<(String, Arc<[ValidationRule]>)> {
        let candidates: Vec<_> = self
            .inner
            .rules
            .read()
            .iter()
            .filter(|(field, rules)| {
                field.as_str() != name
                    && rules.iter().any(|rule| rule.dependencies().iter().any(|d| d == name))
            })
            .map(|(field, rules)| (field.clone(), Arc::clone(rules)))
            .collect();

        let state = self.inner.state.lock();
        candidates
            .into_iter()
            .filter(|(field, _)| state.field(field).is_some_and(|f| f.validated_at().is_some()))
            .collect()
    }

    /// The strategy's interval, or longer if an async rule asks for it.
    fn debounce_for(&self, rules: &[ValidationRule]) -> Duration {
        rules
            .iter()
            .filter(|rule| rule.is_async())
            .filter_map(ValidationRule::debounce)
            .fold(self.inner.strategy.debounce, Duration::max)
    }

    fn schedule(&self, name: &str, value: Value, delay: Duration) -> Result<(), EngineError> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let field = name.to_string();
        self.inner.debouncer.schedule(name, delay, async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let form = FormValidator { inner };
            if let Err(error) = form.run_pass(&field, value, false).await {
                tracing::debug!(%field, %error, "debounced pass dropped");
            }
        })?;
        Ok(())
    }

    async fn validate_every_field(&self, submitting: bool) -> Vec<(String, FieldOutcome)> {
        let names: Vec<String> = self.inner.rules.read().keys().cloned().collect();
        let passes = names.into_iter().map(|name| async move {
            let value = self.value(&name).unwrap_or(Value::Null);
            let outcome = self.run_pass(&name, value, submitting).await;
            outcome.ok().map(|outcome| (name, outcome))
        });
        futures::future::join_all(passes)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn run_pass(&self, name: &str, value: Value, submitting: bool) -> Result<FieldOutcome, EngineError> {
        let rules = self.rules(name)?;

        let (skipping, retry_config) = {
            let active = self.inner.active.lock();
            (
                active.skipping(&self.inner.exceptions, name),
                active.retry_config(&self.inner.exceptions),
            )
        };
        if let Some(state) = skipping {
            tracing::debug!(field = name, %state, "validation skipped");
            return Ok(FieldOutcome::Skipped(state));
        }

        let pass = self.inner.next_pass.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut state = self.inner.state.lock();
            let field = state
                .field_mut(name)
                .ok_or_else(|| EngineError::UnknownField(name.to_string()))?;
            field.begin(pass);
        }

        let ctx = Arc::new(ValidationContext {
            field: name.to_string(),
            form_data: self.inner.values.lock().clone(),
            is_submitting: submitting,
        });
        let policy = RetryPolicy::new(
            retry_config.or(self.inner.strategy.retry),
            self.inner.strategy.async_validation.timeout,
        );

        let result = evaluate::evaluate_rules(name, &rules, &value, ctx, &policy).await;

        let status = {
            let mut state = self.inner.state.lock();
            let Some(field) = state.field_mut(name) else {
                return Err(EngineError::UnknownField(name.to_string()));
            };
            if !field.complete_pass(pass, value, result.clone()) {
                tracing::debug!(field = name, pass, "stale pass dropped");
                return Ok(FieldOutcome::Superseded);
            }
            field.status()
        };

        if let Some(meta) = &result.metadata {
            tracing::debug!(
                field = name,
                %status,
                duration_ms = u64::try_from(meta.duration.as_millis()).unwrap_or(u64::MAX),
                rules = meta.rules_evaluated,
                retries = meta.retries,
                "field validated"
            );
        }
        Ok(FieldOutcome::Validated(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ValidationErrorType;
    use crate::validators::{custom_async, matches_field, min_length, required};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn signup() -> FormValidator {
        let form = FormValidator::new(ValidationStrategy::eager());
        form.register_field("username", vec![required("Username is required"), min_length(3, "Too short")]);
        form.register_field("password", vec![required("Password is required")]);
        form
    }

    #[tokio::test]
    async fn registered_fields_start_pending() {
        let form = signup();
        assert_eq!(form.status(), ValidationStatus::Pending);
        assert_eq!(
            form.field_state("username").unwrap().status(),
            ValidationStatus::Pending
        );
        assert_eq!(form.value("username"), Some(Value::Null));
    }

    #[tokio::test]
    async fn validate_field_updates_state() {
        let form = signup();
        let outcome = form.validate_field("username", json!("ab")).await.unwrap();

        let result = outcome.result().unwrap();
        assert!(!result.is_valid);
        let field = form.field_state("username").unwrap();
        assert_eq!(field.status(), ValidationStatus::Invalid);
        assert_eq!(field.first_message(), Some("Too short"));
        assert_eq!(form.status(), ValidationStatus::Invalid);

        form.validate_field("username", json!("alice")).await.unwrap();
        assert_eq!(form.field_state("username").unwrap().status(), ValidationStatus::Valid);
        assert!(form.field_state("username").unwrap().errors().is_empty());
    }

    #[tokio::test]
    async fn unknown_field_is_an_error() {
        let form = signup();
        assert_eq!(
            form.validate_field("nope", json!(1)).await,
            Err(EngineError::UnknownField("nope".into()))
        );
        assert!(form.handle_change("nope", json!(1)).is_err());
    }

    #[tokio::test]
    async fn submit_validates_every_field() {
        let form = signup();
        form.handle_change("username", json!("alice")).unwrap();

        let outcome = form.submit().await;
        assert_eq!(outcome.attempt, 1);
        assert_eq!(outcome.status, ValidationStatus::Invalid);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field, "password");
        assert!(!form.snapshot().is_submitting());

        form.handle_change("password", json!("hunter2")).unwrap();
        let outcome = form.submit().await;
        assert_eq!(outcome.attempt, 2);
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn rules_see_submitting_flag() {
        let form = FormValidator::new(ValidationStrategy::on_submit());
        form.register_field(
            "terms",
            vec![ValidationRule::new(ValidationErrorType::Business, "Accept the terms", |v, ctx| {
                !ctx.is_submitting || v == &json!(true)
            })],
        );

        assert!(form.validate_field("terms", json!(false)).await.unwrap().result().unwrap().is_valid);
        assert!(!form.submit().await.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_validate_once_with_last_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let form = FormValidator::new(ValidationStrategy::eager().with_debounce(Duration::from_millis(300)));
        form.register_field(
            "query",
            vec![custom_async("Not found", move |value, _| {
                log.lock().push(value);
                async { Ok(true) }
            })],
        );

        for n in 1..=5 {
            form.handle_change("query", json!(n)).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(form.pending_validations(), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*seen.lock(), vec![json!(5)]);
        assert_eq!(form.field_state("query").unwrap().status(), ValidationStatus::Valid);
        assert_eq!(form.field_state("query").unwrap().last_value(), Some(&json!(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn async_rule_debounce_extends_interval() {
        let form = FormValidator::new(ValidationStrategy::eager().with_debounce(Duration::from_millis(100)));
        form.register_field(
            "slug",
            vec![custom_async("taken", |_, _| async { Ok(false) }).with_debounce(Duration::from_millis(800))],
        );

        form.handle_change("slug", json!("abc")).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(form.field_state("slug").unwrap().status(), ValidationStatus::Pending);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(form.field_state("slug").unwrap().status(), ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn blur_validates_and_marks_touched() {
        let form = FormValidator::new(ValidationStrategy::on_blur());
        form.register_field("name", vec![required("Required")]);

        form.handle_change("name", json!("")).unwrap();
        assert_eq!(form.pending_validations(), 0);

        let outcome = form.handle_blur("name").await.unwrap();
        assert!(matches!(outcome, Some(FieldOutcome::Validated(ref r)) if !r.is_valid));
        let field = form.field_state("name").unwrap();
        assert!(field.touched());
        assert!(field.dirty());
    }

    #[tokio::test]
    async fn blur_without_trigger_does_not_validate() {
        let form = FormValidator::new(ValidationStrategy::on_submit());
        form.register_field("name", vec![required("Required")]);
        assert_eq!(form.handle_blur("name").await.unwrap(), None);
        assert!(form.field_state("name").unwrap().touched());
        assert_eq!(form.status(), ValidationStatus::Pending);
    }

    #[tokio::test]
    async fn offline_skips_validation() {
        let form = signup();
        form.validate_field("username", json!("x")).await.unwrap();
        assert!(form.enter_exception(FrontendExceptionState::NetworkOffline));
        assert!(!form.enter_exception(FrontendExceptionState::NetworkOffline));
        assert!(form.is_offline_mode());

        let outcome = form.validate_field("username", json!("alice")).await.unwrap();
        assert_eq!(outcome, FieldOutcome::Skipped(FrontendExceptionState::NetworkOffline));
        assert_eq!(form.field_state("username").unwrap().status(), ValidationStatus::Invalid);

        form.leave_exception(FrontendExceptionState::NetworkOffline);
        form.validate_field("username", json!("alice")).await.unwrap();
        assert_eq!(form.field_state("username").unwrap().status(), ValidationStatus::Valid);
    }

    #[tokio::test]
    async fn fallback_message_follows_active_state() {
        let form = signup();
        assert_eq!(form.fallback_message(), None);
        form.enter_exception(FrontendExceptionState::ServerError);
        assert!(form.fallback_message().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exception_retry_config_overrides_strategy() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let form = FormValidator::new(ValidationStrategy::on_submit());
        form.register_field(
            "email",
            vec![custom_async("taken", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(crate::rule::RuleFailure::Failed("503".into())) }
            })],
        );

        form.validate_field("email", json!("a@b.c")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(form.field_state("email").unwrap().status(), ValidationStatus::Error);

        form.enter_exception(FrontendExceptionState::ServerError);
        calls.store(0, Ordering::SeqCst);
        form.validate_field("email", json!("a@b.c")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn server_errors_attach_to_fields() {
        let form = signup();
        form.apply_server_errors(vec![
            ValidationError::server(ValidationErrorType::Unique, "username", "Already taken"),
            ValidationError::global(ValidationErrorType::Business, "Signups are closed"),
            ValidationError::server(ValidationErrorType::Business, "ghost", "Unknown field"),
        ]);

        let snapshot = form.snapshot();
        assert_eq!(snapshot.field("username").unwrap().status(), ValidationStatus::Invalid);
        assert_eq!(snapshot.global_errors().len(), 2);
        assert_eq!(snapshot.status(), ValidationStatus::Invalid);

        form.clear_global_errors();
        assert!(form.snapshot().global_errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dependents_are_revalidated() {
        let form = FormValidator::new(ValidationStrategy::eager().with_debounce(Duration::from_millis(10)));
        form.register_field("password", vec![required("Required")]);
        form.register_field("confirm", vec![matches_field("password", "Passwords differ")]);

        form.validate_field("password", json!("secret")).await.unwrap();
        form.validate_field("confirm", json!("secret")).await.unwrap();
        assert_eq!(form.field_state("confirm").unwrap().status(), ValidationStatus::Valid);

        form.handle_change("password", json!("changed")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(form.field_state("confirm").unwrap().status(), ValidationStatus::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn unregister_cancels_pending_pass() {
        let form = signup();
        form.handle_change("username", json!("a")).unwrap();
        assert_eq!(form.pending_validations(), 1);
        assert!(form.unregister_field("username"));
        assert_eq!(form.pending_validations(), 0);
        assert!(form.field_state("username").is_none());
        assert!(!form.is_registered("username"));
    }

    #[tokio::test]
    async fn reset_returns_fields_to_pending() {
        let form = signup();
        form.submit().await;
        form.reset();
        let snapshot = form.snapshot();
        assert_eq!(snapshot.status(), ValidationStatus::Pending);
        assert_eq!(snapshot.submit_attempts(), 0);
    }

    #[tokio::test]
    async fn mount_respects_strategy() {
        let form = signup();
        assert!(form.mount().await.is_none());

        let mut strategy = ValidationStrategy::on_blur();
        strategy.async_validation.validate_on_mount = true;
        let form = FormValidator::new(strategy);
        form.register_field("name", vec![required("Required")]);
        let outcomes = form.mount().await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(form.status(), ValidationStatus::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_blur_pass_does_not_overwrite_newer_value() {
        let form = FormValidator::new(ValidationStrategy::eager().with_debounce(Duration::from_millis(100)));
        form.register_field(
            "handle",
            vec![custom_async("Handle is taken", |value, _| async move {
                if value == json!("old") {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                Ok(value == json!("new"))
            })],
        );

        form.handle_change("handle", json!("old")).unwrap();
        let blurred = form.clone();
        let blur = tokio::spawn(async move { blurred.handle_blur("handle").await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        form.handle_change("handle", json!("new")).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let field = form.field_state("handle").unwrap();
        assert_eq!(field.status(), ValidationStatus::Valid);
        assert_eq!(field.last_value(), Some(&json!("new")));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(blur.await.unwrap(), Ok(Some(FieldOutcome::Superseded)));
        let field = form.field_state("handle").unwrap();
        assert_eq!(field.status(), ValidationStatus::Valid);
        assert_eq!(field.last_value(), Some(&json!("new")));
        assert!(field.errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_pass_in_flight() {
        let form = FormValidator::new(ValidationStrategy::on_blur());
        form.register_field(
            "handle",
            vec![custom_async("Handle is taken", |_, _| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(false)
            })],
        );

        let validating = form.clone();
        let pass = tokio::spawn(async move { validating.validate_field("handle", json!("x")).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        form.reset();

        assert_eq!(pass.await.unwrap(), Ok(FieldOutcome::Superseded));
        assert_eq!(form.field_state("handle").unwrap().status(), ValidationStatus::Pending);
    }
}
