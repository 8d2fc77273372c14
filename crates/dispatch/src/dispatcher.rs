//! Global error dispatcher
//!
//! Turns an [`HttpError`] into at most one navigation. The checks run in a
//! fixed order and the first match wins:
//!
//! | # | Condition                                        | Action                            |
//! |---|--------------------------------------------------|-----------------------------------|
//! | 1 | 400 while on the login page                      | nothing                           |
//! | 2 | 401                                              | clear `token`/`user`, `/login` (replace) |
//! | 3 | 403                                              | `/error/forbidden`                |
//! | 4 | 404                                              | `/error/not-found`                |
//! | 5 | 500, 502, 503, 504                               | `/error/server-error`             |
//! | 6 | network code, offline, or connectivity message   | `/error/network-error`            |
//! | 7 | anything else                                    | `/error/generic` with the error   |
//!
//! The dispatcher never retries.

use std::sync::Arc;

use chrono::Utc;
use phoenix_validator::exception::FrontendExceptionState;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{DispatchError, DispatchResult, HttpError};
use crate::host::{Environment, Navigator, Storage};
use crate::route::{Navigation, Route};

const SERVER_ERROR_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Dispatcher settings. Missing keys take defaults; unknown keys are
/// rejected.
///
/// The login page is always [`Route::Login`]: the 400 carve-out and the 401
/// redirect use the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Storage key of the auth token cleared on 401.
    pub token_key: String,
    /// Storage key of the cached user cleared on 401.
    pub user_key: String,
    /// Transport codes that mean the request never reached the server.
    pub network_codes: Vec<String>,
    /// Message fragments that mean the same, matched case-insensitively.
    pub network_markers: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            token_key: "token".to_string(),
            user_key: "user".to_string(),
            network_codes: vec!["NETWORK_ERROR".to_string(), "REQUEST_ABORTED".to_string()],
            network_markers: vec![
                "Network Error".to_string(),
                "网络连接失败".to_string(),
                "fetch".to_string(),
            ],
        }
    }
}

impl DispatcherConfig {
    pub fn from_json(json: &str) -> DispatchResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DispatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.token_key.is_empty() || self.user_key.is_empty() {
            return Err(DispatchError::Config("storage keys must not be empty".to_string()));
        }
        Ok(())
    }

    fn is_network_code(&self, code: &str) -> bool {
        self.network_codes.iter().any(|c| c == code)
    }

    fn has_network_marker(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.network_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| message.contains(&marker.to_lowercase()))
    }
}

/// Which branch an error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    LoginBadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Server,
    Network,
    Other,
}

impl ErrorClass {
    /// Target page, or `None` when the error is left to the page.
    pub const fn route(self) -> Option<Route> {
        match self {
            Self::LoginBadRequest => None,
            Self::Unauthorized => Some(Route::Login),
            Self::Forbidden => Some(Route::Forbidden),
            Self::NotFound => Some(Route::NotFound),
            Self::Server => Some(Route::ServerError),
            Self::Network => Some(Route::NetworkError),
            Self::Other => Some(Route::Generic),
        }
    }
}

/// What [`ErrorDispatcher::dispatch`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchAction {
    /// The error was left to the current page.
    Ignored,
    Navigated(Navigation),
}

impl DispatchAction {
    pub fn route(&self) -> Option<Route> {
        match self {
            Self::Ignored => None,
            Self::Navigated(navigation) => Some(navigation.route),
        }
    }
}

/// Routes HTTP errors to error pages.
#[derive(Clone)]
pub struct ErrorDispatcher {
    config: DispatcherConfig,
    navigator: Arc<dyn Navigator>,
    storage: Arc<dyn Storage>,
    environment: Arc<dyn Environment>,
}

impl std::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ErrorDispatcher {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        storage: Arc<dyn Storage>,
        environment: Arc<dyn Environment>,
    ) -> Self {
        Self {
            config: DispatcherConfig::default(),
            navigator,
            storage,
            environment,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Classifies `error` against the current environment without acting.
    pub fn classify(&self, error: &HttpError) -> ErrorClass {
        match error.effective_status() {
            Some(400) if self.environment.current_path() == Route::Login.path() => {
                ErrorClass::LoginBadRequest
            }
            Some(401) => ErrorClass::Unauthorized,
            Some(403) => ErrorClass::Forbidden,
            Some(404) => ErrorClass::NotFound,
            Some(status) if SERVER_ERROR_STATUSES.contains(&status) => ErrorClass::Server,
            _ if self.is_network_failure(error) => ErrorClass::Network,
            _ => ErrorClass::Other,
        }
    }

    /// The exception state an error puts the client in, if any.
    pub fn exception_state(&self, error: &HttpError) -> Option<FrontendExceptionState> {
        match (error.effective_status(), self.classify(error)) {
            (_, ErrorClass::Unauthorized) => Some(FrontendExceptionState::SessionExpired),
            (_, ErrorClass::Forbidden) => Some(FrontendExceptionState::PermissionDenied),
            (Some(409), _) => Some(FrontendExceptionState::DataConflict),
            (Some(429), _) => Some(FrontendExceptionState::RateLimited),
            (Some(503), _) => Some(FrontendExceptionState::ServerMaintenance),
            (_, ErrorClass::Server) => Some(FrontendExceptionState::ServerError),
            (_, ErrorClass::Network) if !self.environment.is_online() => {
                Some(FrontendExceptionState::NetworkOffline)
            }
            (_, ErrorClass::Network) => Some(FrontendExceptionState::NetworkSlow),
            _ => None,
        }
    }

    /// Performs the action for `error`. Exactly one navigation or none.
    pub fn dispatch(&self, error: &HttpError) -> DispatchResult<DispatchAction> {
        let class = self.classify(error);
        let current_path = self.environment.current_path();
        tracing::warn!(
            class = ?class,
            status = ?error.effective_status(),
            message = error.message_text(),
            url = error.url().unwrap_or(""),
            code = error.code.as_deref().unwrap_or(""),
            current_path = %current_path,
            timestamp = %Utc::now().to_rfc3339(),
            "dispatching HTTP error"
        );

        let navigation = match class {
            ErrorClass::LoginBadRequest => {
                tracing::debug!("bad request on the login page, leaving it to the page");
                return Ok(DispatchAction::Ignored);
            }
            ErrorClass::Unauthorized => {
                self.clear_session();
                Navigation::replace(Route::Login)
            }
            ErrorClass::Other => {
                let navigation = Navigation::push(Route::Generic);
                match serde_json::to_value(error) {
                    Ok(state) => navigation.with_state(state),
                    Err(e) => {
                        tracing::error!(error = %e, "could not attach error to navigation state");
                        navigation
                    }
                }
            }
            class => match class.route() {
                Some(route) => Navigation::push(route),
                None => return Ok(DispatchAction::Ignored),
            },
        };

        self.navigate(navigation)
    }

    /// Sends an uncaught application error to the generic error page.
    pub fn dispatch_uncaught(&self, message: &str, source: Option<&str>) -> DispatchResult<DispatchAction> {
        tracing::error!(
            message,
            source = source.unwrap_or(""),
            current_path = %self.environment.current_path(),
            timestamp = %Utc::now().to_rfc3339(),
            "uncaught application error"
        );
        let mut state = json!({ "message": message });
        if let Some(source) = source {
            state["source"] = json!(source);
        }
        self.navigate(Navigation::push(Route::Generic).with_state(state))
    }

    fn navigate(&self, navigation: Navigation) -> DispatchResult<DispatchAction> {
        self.navigator.navigate(navigation.clone()).map_err(|e| {
            tracing::error!(path = navigation.path(), error = %e, "navigation failed");
            DispatchError::from(e)
        })?;
        Ok(DispatchAction::Navigated(navigation))
    }

    fn clear_session(&self) {
        for key in [&self.config.token_key, &self.config.user_key] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key = %key, error = %e, "could not clear session storage");
            }
        }
    }

    fn is_network_failure(&self, error: &HttpError) -> bool {
        error
            .code
            .as_deref()
            .is_some_and(|code| self.config.is_network_code(code))
            || !self.environment.is_online()
            || self.config.has_network_marker(error.message_text())
    }
}
