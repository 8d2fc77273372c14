//! Validation rules
//!
//! A [`ValidationRule`] pairs a predicate with the error it produces. The
//! predicate answers `Ok(true)` (accept), `Ok(false)` (reject) or
//! `Err(RuleFailure)` when it could not decide; a panic counts as a failure.
//! Async predicates receive owned copies of the value and context so the
//! returned future is `'static` and can be timed out, retried or dropped.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value;

use crate::foundation::{ValidationContext, ValidationError, ValidationErrorType, ValidationSeverity};

/// Why a predicate could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleFailure {
    /// The predicate returned an error.
    #[error("validator failed: {0}")]
    Failed(String),

    /// A remote check could not reach its backend.
    #[error("network failure: {0}")]
    Network(String),

    /// The predicate panicked.
    #[error("validator panicked: {0}")]
    Panicked(String),
}

impl RuleFailure {
    /// Converts the failure into the error recorded on the field.
    pub fn into_error(self, field: impl Into<Cow<'static, str>>) -> ValidationError {
        match self {
            Self::Network(reason) => {
                ValidationError::new(ValidationErrorType::Network, field, "Could not reach the validation service")
                    .with_code("network")
                    .with_details(serde_json::json!({ "reason": reason }))
            }
            other => ValidationError::validator_failed(field, other),
        }
    }

    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panicked(message)
    }
}

/// Future returned by async predicates.
pub type CheckFuture = BoxFuture<'static, Result<bool, RuleFailure>>;

type SyncCheck = Arc<dyn Fn(&Value, &ValidationContext) -> Result<bool, RuleFailure> + Send + Sync>;
type AsyncCheck = Arc<dyn Fn(Value, Arc<ValidationContext>) -> CheckFuture + Send + Sync>;

/// The predicate of a rule.
#[derive(Clone)]
pub enum Check {
    /// Evaluated inline, never retried.
    Sync(SyncCheck),
    /// Awaited with the strategy's timeout and retry policy.
    Async(AsyncCheck),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Check::Sync"),
            Self::Async(_) => f.write_str("Check::Async"),
        }
    }
}

// ============================================================================
// RULE
// ============================================================================

/// A predicate plus the error it raises when the value is rejected.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    kind: ValidationErrorType,
    message: Cow<'static, str>,
    code: Option<Cow<'static, str>>,
    severity: ValidationSeverity,
    details: Option<Value>,
    check: Check,
    debounce: Option<Duration>,
    dependencies: Vec<String>,
}

impl ValidationRule {
    fn with_check(
        kind: ValidationErrorType,
        message: impl Into<Cow<'static, str>>,
        check: Check,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            severity: ValidationSeverity::Error,
            details: None,
            check,
            debounce: None,
            dependencies: Vec::new(),
        }
    }

    /// A synchronous predicate that always answers.
    pub fn new<F>(kind: ValidationErrorType, message: impl Into<Cow<'static, str>>, predicate: F) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> bool + Send + Sync + 'static,
    {
        Self::with_check(
            kind,
            message,
            Check::Sync(Arc::new(move |value: &Value, ctx: &ValidationContext| {
                Ok(predicate(value, ctx))
            })),
        )
    }

    /// A synchronous predicate that may fail.
    pub fn try_new<F>(
        kind: ValidationErrorType,
        message: impl Into<Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&Value, &ValidationContext) -> Result<bool, RuleFailure> + Send + Sync + 'static,
    {
        Self::with_check(kind, message, Check::Sync(Arc::new(predicate)))
    }

    /// An asynchronous predicate, e.g. a uniqueness check against the backend.
    pub fn new_async<F, Fut>(
        kind: ValidationErrorType,
        message: impl Into<Cow<'static, str>>,
        predicate: F,
    ) -> Self
    where
        F: Fn(Value, Arc<ValidationContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, RuleFailure>> + Send + 'static,
    {
        Self::with_check(
            kind,
            message,
            Check::Async(Arc::new(
                move |value: Value, ctx: Arc<ValidationContext>| -> CheckFuture {
                    predicate(value, ctx).boxed()
                },
            )),
        )
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ValidationSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Quiet period before this rule runs after a change.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    /// Declares that this rule reads another field.
    #[must_use]
    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.dependencies.push(field.into());
        self
    }

    pub fn kind(&self) -> ValidationErrorType {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> ValidationSeverity {
        self.severity
    }

    pub fn is_async(&self) -> bool {
        matches!(self.check, Check::Async(_))
    }

    pub fn debounce(&self) -> Option<Duration> {
        self.debounce
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Runs a synchronous predicate, turning panics into failures.
    ///
    /// Returns `None` for async rules.
    pub fn evaluate_sync(
        &self,
        value: &Value,
        ctx: &ValidationContext,
    ) -> Option<Result<bool, RuleFailure>> {
        match &self.check {
            Check::Sync(predicate) => Some(run_sync(predicate, value, ctx)),
            Check::Async(_) => None,
        }
    }

    /// Starts the predicate as a future, turning panics into failures.
    ///
    /// Sync predicates run immediately and the future is already resolved.
    pub fn evaluate_async(&self, value: Value, ctx: Arc<ValidationContext>) -> CheckFuture {
        match &self.check {
            Check::Sync(predicate) => future::ready(run_sync(predicate, &value, &ctx)).boxed(),
            Check::Async(predicate) => {
                let predicate = Arc::clone(predicate);
                AssertUnwindSafe(async move { predicate(value, ctx).await })
                    .catch_unwind()
                    .map(|outcome| {
                        outcome.unwrap_or_else(|payload| Err(RuleFailure::from_panic(payload.as_ref())))
                    })
                    .boxed()
            }
        }
    }

    /// The error recorded when this rule rejects a value of `field`.
    pub fn violation(&self, field: &str) -> ValidationError {
        let mut error = ValidationError::new(self.kind, field.to_string(), self.message.clone())
            .with_severity(self.severity)
            .with_code(self.code.clone().unwrap_or(Cow::Borrowed(self.kind.as_str())));
        if let Some(details) = &self.details {
            error = error.with_details(details.clone());
        }
        error
    }
}

fn run_sync(
    predicate: &SyncCheck,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<bool, RuleFailure> {
    catch_unwind(AssertUnwindSafe(|| predicate(value, ctx)))
        .unwrap_or_else(|payload| Err(RuleFailure::from_panic(payload.as_ref())))
}
