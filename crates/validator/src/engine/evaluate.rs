//! One validation pass over a field's rules

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::retry::{RetryError, RetryPolicy, retry};
use crate::foundation::{ValidationContext, ValidationError, ValidationMetadata, ValidationResult};
use crate::rule::ValidationRule;

/// Evaluates `rules` in order.
///
/// Stops at the first blocking rejection or at the first predicate that
/// could not answer. Non-blocking rejections are recorded and evaluation
/// continues.
pub(crate) async fn evaluate_rules(
    field: &str,
    rules: &[ValidationRule],
    value: &Value,
    ctx: Arc<ValidationContext>,
    policy: &RetryPolicy,
) -> ValidationResult {
    let started = Instant::now();
    let mut result = ValidationResult::valid();
    let mut rules_evaluated = 0;
    let mut retries = 0;

    for rule in rules {
        rules_evaluated += 1;

        let answer = if rule.is_async() {
            let outcome = retry(policy, |_| rule.evaluate_async(value.clone(), Arc::clone(&ctx))).await;
            retries += outcome.retries;
            outcome.result.map_err(|error| match error {
                RetryError::Failed(failure) => failure.into_error(field.to_string()),
                RetryError::TimedOut(limit) => {
                    let ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    ValidationError::timed_out(field.to_string(), ms)
                }
            })
        } else {
            rule.evaluate_sync(value, &ctx)
                .unwrap_or(Ok(true))
                .map_err(|failure| failure.into_error(field.to_string()))
        };

        match answer {
            Ok(true) => {}
            Ok(false) => {
                let violation = rule.violation(field);
                let blocking = violation.is_blocking();
                result.push(violation);
                if blocking {
                    break;
                }
            }
            Err(error) => {
                tracing::warn!(field, kind = %error.kind, "validator could not answer: {}", error.message);
                result.push(error);
                break;
            }
        }
    }

    result.with_metadata(ValidationMetadata {
        field: field.to_string(),
        duration: started.elapsed(),
        rules_evaluated,
        retries,
    })
}
