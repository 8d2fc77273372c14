//! Frontend exception states
//!
//! An exception state is an abnormal client condition (offline, session
//! expired, rate limited, ...) that changes how validation behaves. Every
//! state maps to an [`ExceptionHandlingStrategy`]; the table is total because
//! it is seeded from an exhaustive `match` and overrides can only replace
//! entries, never remove them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::strategy::RetryConfig;

/// Named abnormal client conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrontendExceptionState {
    NetworkOffline,
    NetworkSlow,
    SessionExpired,
    PermissionDenied,
    RateLimited,
    ServerError,
    ServerMaintenance,
    ValidationServiceUnavailable,
    StorageUnavailable,
    DataConflict,
}

impl FrontendExceptionState {
    /// Number of states.
    pub const COUNT: usize = 10;

    /// Every state, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::NetworkOffline,
        Self::NetworkSlow,
        Self::SessionExpired,
        Self::PermissionDenied,
        Self::RateLimited,
        Self::ServerError,
        Self::ServerMaintenance,
        Self::ValidationServiceUnavailable,
        Self::StorageUnavailable,
        Self::DataConflict,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Wire name, e.g. `NETWORK_OFFLINE`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkOffline => "NETWORK_OFFLINE",
            Self::NetworkSlow => "NETWORK_SLOW",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::RateLimited => "RATE_LIMITED",
            Self::ServerError => "SERVER_ERROR",
            Self::ServerMaintenance => "SERVER_MAINTENANCE",
            Self::ValidationServiceUnavailable => "VALIDATION_SERVICE_UNAVAILABLE",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::DataConflict => "DATA_CONFLICT",
        }
    }

    /// Built-in handling for this state.
    ///
    /// The `match` has no wildcard arm: adding a state without deciding how
    /// to handle it does not compile.
    #[must_use]
    pub fn default_strategy(self) -> ExceptionHandlingStrategy {
        use ExceptionHandlingStrategy as S;

        match self {
            Self::NetworkOffline => S::skip("You are offline. Changes will be checked when you reconnect.")
                .with_offline_mode(),
            Self::NetworkSlow => S::proceed()
                .with_retry(RetryConfig::exponential(3, Duration::from_millis(1000))),
            Self::SessionExpired => S::skip("Your session has expired. Please sign in again."),
            Self::PermissionDenied => S::proceed()
                .with_fallback("You do not have permission to perform this action."),
            Self::RateLimited => S::proceed()
                .with_retry(
                    RetryConfig::exponential(2, Duration::from_millis(2000))
                        .with_max_delay(Duration::from_secs(10)),
                )
                .with_message("Too many requests. Please wait a moment."),
            Self::ServerError => S::proceed()
                .with_retry(RetryConfig::fixed(2, Duration::from_millis(1500)))
                .with_fallback("The server is having trouble. Please try again later."),
            Self::ServerMaintenance => S::skip("The service is under maintenance."),
            Self::ValidationServiceUnavailable => {
                S::skip("Online checks are temporarily unavailable.")
            }
            Self::StorageUnavailable => S::proceed()
                .with_message("Local storage is unavailable; drafts will not be saved."),
            Self::DataConflict => S::proceed()
                .with_fallback("This record was changed elsewhere. Reload to continue."),
        }
    }
}

impl fmt::Display for FrontendExceptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HANDLING STRATEGY
// ============================================================================

/// How validation and UI behave while an exception state is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExceptionHandlingStrategy {
    /// Do not validate affected fields at all.
    pub skip_validation: bool,
    /// Replace the affected panel with a fallback view.
    #[serde(rename = "showFallbackUI")]
    pub show_fallback_ui: bool,
    /// Keep accepting input locally.
    pub enable_offline_mode: bool,
    /// Retry policy for async validation while the state is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    /// Message shown instead of the normal UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,
    /// Fields `skip_validation` applies to. `None` means every field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl ExceptionHandlingStrategy {
    /// Validate normally.
    #[must_use]
    pub fn proceed() -> Self {
        Self::default()
    }

    /// Skip validation and show a fallback message.
    #[must_use]
    pub fn skip(message: impl Into<String>) -> Self {
        Self {
            skip_validation: true,
            show_fallback_ui: true,
            fallback_message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry_config = Some(retry);
        self
    }

    #[must_use]
    pub fn with_offline_mode(mut self) -> Self {
        self.enable_offline_mode = true;
        self
    }

    /// Shows the fallback UI with `message`.
    #[must_use]
    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.show_fallback_ui = true;
        self.fallback_message = Some(message.into());
        self
    }

    /// Sets the message without switching to the fallback UI.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = Some(message.into());
        self
    }

    /// Restricts `skip_validation` to the given fields.
    #[must_use]
    pub fn for_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if `field` must not be validated under this strategy.
    #[must_use]
    pub fn skips(&self, field: &str) -> bool {
        self.skip_validation
            && self
                .fields
                .as_ref()
                .is_none_or(|fields| fields.iter().any(|f| f == field))
    }
}

// ============================================================================
// CONFIG TABLE
// ============================================================================

/// Total mapping from [`FrontendExceptionState`] to its strategy.
///
/// Serialized as a JSON object keyed by state name. Deserializing accepts a
/// partial object: listed states are overridden, the rest keep
/// [`FrontendExceptionState::default_strategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionStateConfig {
    strategies: [ExceptionHandlingStrategy; FrontendExceptionState::COUNT],
}

impl ExceptionStateConfig {
    /// Table of built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: FrontendExceptionState::ALL.map(FrontendExceptionState::default_strategy),
        }
    }

    /// Strategy for `state`. Never fails.
    #[must_use]
    pub fn get(&self, state: FrontendExceptionState) -> &ExceptionHandlingStrategy {
        &self.strategies[state.index()]
    }

    /// Replaces the strategy for `state`.
    pub fn set(&mut self, state: FrontendExceptionState, strategy: ExceptionHandlingStrategy) {
        self.strategies[state.index()] = strategy;
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, state: FrontendExceptionState, strategy: ExceptionHandlingStrategy) -> Self {
        self.set(state, strategy);
        self
    }

    /// Iterates states with their strategies in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (FrontendExceptionState, &ExceptionHandlingStrategy)> {
        FrontendExceptionState::ALL
            .into_iter()
            .zip(self.strategies.iter())
    }

    /// Parses overrides from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ExceptionStateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for ExceptionStateConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.strategies.len()))?;
        for (state, strategy) in self.iter() {
            map.serialize_entry(&state, strategy)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExceptionStateConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides =
            BTreeMap::<FrontendExceptionState, ExceptionHandlingStrategy>::deserialize(deserializer)?;
        let mut config = Self::new();
        for (state, strategy) in overrides {
            config.set(state, strategy);
        }
        Ok(config)
    }
}

// ============================================================================
// ACTIVE SET
// ============================================================================

/// Exception states currently in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveExceptions {
    states: BTreeSet<FrontendExceptionState>,
}

impl ActiveExceptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates `state`; returns false if it was already active.
    pub fn enter(&mut self, state: FrontendExceptionState) -> bool {
        self.states.insert(state)
    }

    /// Deactivates `state`; returns false if it was not active.
    pub fn leave(&mut self, state: FrontendExceptionState) -> bool {
        self.states.remove(&state)
    }

    #[must_use]
    pub fn is_active(&self, state: FrontendExceptionState) -> bool {
        self.states.contains(&state)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Active states in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = FrontendExceptionState> + '_ {
        self.states.iter().copied()
    }

    /// The first active state whose strategy skips `field`.
    #[must_use]
    pub fn skipping(
        &self,
        config: &ExceptionStateConfig,
        field: &str,
    ) -> Option<FrontendExceptionState> {
        self.iter().find(|state| config.get(*state).skips(field))
    }

    /// Retry policy from the first active state that defines one.
    #[must_use]
    pub fn retry_config(&self, config: &ExceptionStateConfig) -> Option<RetryConfig> {
        self.iter().find_map(|state| config.get(state).retry_config)
    }

    /// Fallback message from the first active state showing fallback UI.
    #[must_use]
    pub fn fallback_message<'a>(&self, config: &'a ExceptionStateConfig) -> Option<&'a str> {
        self.iter()
            .map(|state| config.get(state))
            .find(|strategy| strategy.show_fallback_ui)
            .and_then(|strategy| strategy.fallback_message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_state_has_a_strategy() {
        let config = ExceptionStateConfig::new();
        for state in FrontendExceptionState::ALL {
            // Indexing is total; also check the table lines up with the enum.
            assert_eq!(config.get(state), &state.default_strategy());
        }
        assert_eq!(config.iter().count(), FrontendExceptionState::ALL.len());
    }

    #[test]
    fn all_is_in_discriminant_order() {
        for (i, state) in FrontendExceptionState::ALL.into_iter().enumerate() {
            assert_eq!(state.index(), i);
        }
    }

    #[test]
    fn offline_skips_validation() {
        let config = ExceptionStateConfig::new();
        let offline = config.get(FrontendExceptionState::NetworkOffline);
        assert!(offline.skip_validation);
        assert!(offline.enable_offline_mode);
        assert!(offline.skips("anything"));
    }

    #[test]
    fn field_scoped_skip() {
        let strategy = ExceptionHandlingStrategy::skip("down").for_fields(["username"]);
        assert!(strategy.skips("username"));
        assert!(!strategy.skips("bio"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ExceptionStateConfig::from_json(
            r#"{ "NETWORK_OFFLINE": { "skipValidation": false, "fallbackMessage": "offline" } }"#,
        )
        .unwrap();

        let offline = config.get(FrontendExceptionState::NetworkOffline);
        assert!(!offline.skip_validation);
        assert_eq!(offline.fallback_message.as_deref(), Some("offline"));
        assert_eq!(
            config.get(FrontendExceptionState::RateLimited),
            &FrontendExceptionState::RateLimited.default_strategy()
        );
    }

    #[test]
    fn serializes_every_state() {
        let value = serde_json::to_value(ExceptionStateConfig::new()).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), FrontendExceptionState::ALL.len());
        assert_eq!(map["SESSION_EXPIRED"]["skipValidation"], true);
        assert_eq!(map["PERMISSION_DENIED"]["showFallbackUI"], true);
    }

    #[test]
    fn active_set_queries() {
        let config = ExceptionStateConfig::new();
        let mut active = ActiveExceptions::new();
        assert!(active.skipping(&config, "email").is_none());
        assert!(active.retry_config(&config).is_none());

        assert!(active.enter(FrontendExceptionState::NetworkSlow));
        assert!(!active.enter(FrontendExceptionState::NetworkSlow));
        assert!(active.retry_config(&config).is_some());
        assert!(active.skipping(&config, "email").is_none());

        active.enter(FrontendExceptionState::NetworkOffline);
        assert_eq!(
            active.skipping(&config, "email"),
            Some(FrontendExceptionState::NetworkOffline)
        );
        assert!(active.fallback_message(&config).is_some());

        assert!(active.leave(FrontendExceptionState::NetworkOffline));
        assert!(!active.leave(FrontendExceptionState::NetworkOffline));
        assert!(active.skipping(&config, "email").is_none());
    }
}
