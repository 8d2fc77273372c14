//! Failure isolation
//!
//! [`ErrorBoundary`] wraps the rendering of one panel: an error or a panic
//! inside it replaces the panel with a [`FallbackView`] until the user
//! retries. [`Supervisor`] does the same for long-running async workers by
//! respawning them after a panic.

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use phoenix_validator::strategy::RetryConfig;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// A failure captured by a boundary or supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedFailure {
    /// Name of the panel or worker that failed.
    pub scope: String,
    pub message: String,
    /// True if the failure was a panic rather than a returned error.
    pub panicked: bool,
    pub at: DateTime<Utc>,
}

impl CapturedFailure {
    fn new(scope: &str, message: String, panicked: bool) -> Self {
        Self {
            scope: scope.to_string(),
            message,
            panicked,
            at: Utc::now(),
        }
    }

    fn from_panic(scope: &str, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::new(scope, message, true)
    }
}

/// External monitoring collaborator.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, failure: &CapturedFailure);
}

impl<F> ErrorReporter for F
where
    F: Fn(&CapturedFailure) + Send + Sync,
{
    fn report(&self, failure: &CapturedFailure) {
        self(failure);
    }
}

// ============================================================================
// ERROR BOUNDARY
// ============================================================================

/// What replaces a failed panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackView {
    pub title: String,
    pub message: String,
    pub can_retry: bool,
}

impl FallbackView {
    fn for_failure(failure: &CapturedFailure) -> Self {
        Self {
            title: "Something went wrong".to_string(),
            message: failure.message.clone(),
            can_retry: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoundaryState {
    #[default]
    Healthy,
    Failed(CapturedFailure),
}

/// Output of [`ErrorBoundary::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    Fallback(FallbackView),
}

impl<T> Rendered<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Self::Content(value) => Some(value),
            Self::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Contains failures of one panel.
pub struct ErrorBoundary {
    name: String,
    state: BoundaryState,
    failures: u32,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl ErrorBoundary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: BoundaryState::Healthy,
            failures: 0,
            reporter: None,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Failures captured since the boundary was created.
    pub fn failure_count(&self) -> u32 {
        self.failures
    }

    /// Renders the panel with `render`, or the fallback while failed.
    pub fn render<T, E, F>(&mut self, render: F) -> Rendered<T>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        if let BoundaryState::Failed(failure) = &self.state {
            return Rendered::Fallback(FallbackView::for_failure(failure));
        }

        let failure = match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(content)) => return Rendered::Content(content),
            Ok(Err(error)) => CapturedFailure::new(&self.name, error.to_string(), false),
            Err(payload) => CapturedFailure::from_panic(&self.name, payload.as_ref()),
        };

        tracing::error!(
            boundary = %self.name,
            panicked = failure.panicked,
            "panel failed: {}",
            failure.message
        );
        if let Some(reporter) = &self.reporter {
            reporter.report(&failure);
        }
        self.failures = self.failures.saturating_add(1);
        let fallback = FallbackView::for_failure(&failure);
        self.state = BoundaryState::Failed(failure);
        Rendered::Fallback(fallback)
    }

    /// Clears the failure so the next render calls the panel again.
    pub fn reset(&mut self) {
        if self.is_failed() {
            tracing::info!(boundary = %self.name, "boundary reset");
        }
        self.state = BoundaryState::Healthy;
    }
}

// ============================================================================
// SUPERVISOR
// ============================================================================

/// How often and how fast a panicking worker is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub backoff: RetryConfig,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 3,
            backoff: RetryConfig::default(),
        }
    }
}

/// How supervision ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The worker returned normally.
    Completed,
    /// The worker kept panicking and the restart budget ran out.
    GaveUp(CapturedFailure),
    /// The worker task was cancelled from outside.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorExit {
    pub restarts: u32,
    pub outcome: WorkerOutcome,
}

/// Aborts the worker task when the supervision loop is dropped, so that
/// aborting the supervisor also stops the worker it is waiting on.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs an async worker and respawns it when it panics.
///
/// Dropping or aborting the supervision loop aborts the running worker.
pub struct Supervisor {
    name: String,
    policy: RestartPolicy,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(name: impl Into<String>, policy: RestartPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            reporter: None,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Spawns the supervision loop. `factory` builds a fresh worker for
    /// every run.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn spawn<F, Fut>(self, factory: F) -> JoinHandle<SupervisorExit>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(factory))
    }

    /// The supervision loop itself, for callers that want to await it inline.
    pub async fn run<F, Fut>(self, mut factory: F) -> SupervisorExit
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut restarts = 0;
        loop {
            let mut worker = AbortOnDrop(tokio::spawn(factory()));
            let outcome = match (&mut worker.0).await {
                Ok(()) => WorkerOutcome::Completed,
                Err(error) if error.is_panic() => {
                    let payload = error.into_panic();
                    let failure = CapturedFailure::from_panic(&self.name, payload.as_ref());
                    tracing::error!(
                        worker = %self.name,
                        restarts,
                        "worker panicked: {}",
                        failure.message
                    );
                    if let Some(reporter) = &self.reporter {
                        reporter.report(&failure);
                    }
                    if restarts >= self.policy.max_restarts {
                        WorkerOutcome::GaveUp(failure)
                    } else {
                        let delay = self.policy.backoff.delay_for(restarts);
                        tokio::time::sleep(delay).await;
                        restarts += 1;
                        tracing::info!(worker = %self.name, restarts, "worker restarted");
                        continue;
                    }
                }
                Err(_) => WorkerOutcome::Cancelled,
            };
            return SupervisorExit { restarts, outcome };
        }
    }
}
