//! Route surface owned by the dispatcher

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pages the dispatcher can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Forbidden,
    NotFound,
    ServerError,
    NetworkError,
    Generic,
    Unauthorized,
    Home,
}

impl Route {
    pub const ALL: [Self; 8] = [
        Self::Login,
        Self::Forbidden,
        Self::NotFound,
        Self::ServerError,
        Self::NetworkError,
        Self::Generic,
        Self::Unauthorized,
        Self::Home,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Forbidden => "/error/forbidden",
            Self::NotFound => "/error/not-found",
            Self::ServerError => "/error/server-error",
            Self::NetworkError => "/error/network-error",
            Self::Generic => "/error/generic",
            Self::Unauthorized => "/error/unauthorized",
            Self::Home => "/",
        }
    }

    /// Parses an exact path. Query strings and trailing slashes are not accepted.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    pub const fn is_error_page(self) -> bool {
        !matches!(self, Self::Login | Self::Home)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Returned when a path is not one of the known routes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route `{0}`")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s).ok_or_else(|| UnknownRoute(s.to_string()))
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

impl<'de> Deserialize<'de> for Route {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        path.parse().map_err(serde::de::Error::custom)
    }
}

/// One navigation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub route: Route,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
    /// Data for the target page, e.g. the error being displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl Navigation {
    pub fn push(route: Route) -> Self {
        Self {
            route,
            replace: false,
            state: None,
        }
    }

    pub fn replace(route: Route) -> Self {
        Self {
            route,
            replace: true,
            state: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn path(&self) -> &'static str {
        self.route.path()
    }
}
