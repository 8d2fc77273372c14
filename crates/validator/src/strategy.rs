//! When and how validation runs
//!
//! A [`ValidationStrategy`] decides which UI events trigger a pass, how long
//! to debounce keystrokes, how async predicates are retried and how long
//! they may take.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::result::{duration_ms, option_duration_ms};

/// UI events that can start a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationTrigger {
    OnChange,
    OnBlur,
    OnSubmit,
}

// ============================================================================
// RETRY
// ============================================================================

/// Retry policy for async validation calls.
///
/// Delay before retry `n` (0-based) is `delay` for fixed backoff, or
/// `delay * 2^n` capped at `max_delay` for exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between attempts.
    #[serde(with = "duration_ms")]
    pub delay: Duration,
    /// Double the delay on every retry.
    pub exponential_backoff: bool,
    /// Upper bound for exponential delays.
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Fixed delay between attempts.
    #[must_use]
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            exponential_backoff: false,
            max_delay: delay,
        }
    }

    /// Exponential backoff starting at `delay`.
    #[must_use]
    pub fn exponential(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            exponential_backoff: true,
            ..Self::default()
        }
    }

    /// Caps exponential delays.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Never retry.
    #[must_use]
    pub fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Delay to wait before retry number `retry` (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if !self.exponential_backoff {
            return self.delay;
        }
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay.max(self.delay))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
            exponential_backoff: true,
            max_delay: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// ASYNC VALIDATION
// ============================================================================

/// Limits for async predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AsyncValidationConfig {
    /// Per-attempt time limit. The call is dropped, and thereby cancelled,
    /// when it elapses.
    #[serde(with = "option_duration_ms")]
    pub timeout: Option<Duration>,
    /// Validate every registered field once when the form is created.
    pub validate_on_mount: bool,
}

impl Default for AsyncValidationConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            validate_on_mount: false,
        }
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

/// Configuration describing when validation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationStrategy {
    /// Events that start a pass. Submit always validates.
    pub triggers: Vec<ValidationTrigger>,
    /// Minimum quiet period after a change before validating.
    #[serde(with = "duration_ms")]
    pub debounce: Duration,
    /// Retry policy for async predicates when no exception state overrides it.
    pub retry: Option<RetryConfig>,
    /// Async predicate limits.
    pub async_validation: AsyncValidationConfig,
    /// Re-validate fields that declare the changed field as a dependency.
    pub validate_dependents: bool,
}

impl ValidationStrategy {
    /// Validate on every change (debounced) and on blur.
    #[must_use]
    pub fn eager() -> Self {
        Self {
            triggers: vec![
                ValidationTrigger::OnChange,
                ValidationTrigger::OnBlur,
                ValidationTrigger::OnSubmit,
            ],
            ..Self::default()
        }
    }

    /// Validate when a field loses focus.
    #[must_use]
    pub fn on_blur() -> Self {
        Self::default()
    }

    /// Validate only on submit.
    #[must_use]
    pub fn on_submit() -> Self {
        Self {
            triggers: vec![ValidationTrigger::OnSubmit],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.async_validation.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_dependents(mut self, validate_dependents: bool) -> Self {
        self.validate_dependents = validate_dependents;
        self
    }

    /// Returns true if `trigger` starts a pass.
    #[must_use]
    pub fn triggers_on(&self, trigger: ValidationTrigger) -> bool {
        trigger == ValidationTrigger::OnSubmit || self.triggers.contains(&trigger)
    }

    /// Parses a strategy from JSON; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ValidationStrategy {
    fn default() -> Self {
        Self {
            triggers: vec![ValidationTrigger::OnBlur, ValidationTrigger::OnSubmit],
            debounce: Duration::from_millis(300),
            retry: None,
            async_validation: AsyncValidationConfig::default(),
            validate_dependents: true,
        }
    }
}
