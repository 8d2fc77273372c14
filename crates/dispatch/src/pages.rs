//! Full-page error templates

use serde::Serialize;

use crate::route::Route;

/// Buttons offered by an error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PageAction {
    /// Reload the page the user came from.
    Retry,
    GoHome,
    Login,
}

impl PageAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Retry => "Try again",
            Self::GoHome => "Back to home",
            Self::Login => "Sign in",
        }
    }

    /// Route the action leads to. `Retry` stays where the user was.
    pub const fn target(self) -> Option<Route> {
        match self {
            Self::Retry => None,
            Self::GoHome => Some(Route::Home),
            Self::Login => Some(Route::Login),
        }
    }
}

/// Content of one error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPage {
    pub route: Route,
    /// HTTP status shown on the page, if there is one.
    pub status: Option<u16>,
    pub title: &'static str,
    pub description: &'static str,
    pub actions: &'static [PageAction],
}

static PAGES: [ErrorPage; 6] = [
    ErrorPage {
        route: Route::Forbidden,
        status: Some(403),
        title: "Access denied",
        description: "You do not have permission to view this page.",
        actions: &[PageAction::GoHome],
    },
    ErrorPage {
        route: Route::NotFound,
        status: Some(404),
        title: "Page not found",
        description: "The page you are looking for does not exist or has been moved.",
        actions: &[PageAction::GoHome],
    },
    ErrorPage {
        route: Route::ServerError,
        status: Some(500),
        title: "Server error",
        description: "The server ran into a problem. Please try again in a moment.",
        actions: &[PageAction::Retry, PageAction::GoHome],
    },
    ErrorPage {
        route: Route::NetworkError,
        status: None,
        title: "Network error",
        description: "We could not reach the server. Check your connection and try again.",
        actions: &[PageAction::Retry, PageAction::GoHome],
    },
    ErrorPage {
        route: Route::Generic,
        status: None,
        title: "Something went wrong",
        description: "An unexpected error occurred.",
        actions: &[PageAction::Retry, PageAction::GoHome],
    },
    ErrorPage {
        route: Route::Unauthorized,
        status: Some(401),
        title: "Sign in required",
        description: "Your session has expired. Please sign in again.",
        actions: &[PageAction::Login, PageAction::GoHome],
    },
];

impl ErrorPage {
    /// The template rendered at `route`. `None` for non-error routes.
    pub fn for_route(route: Route) -> Option<&'static Self> {
        PAGES.iter().find(|page| page.route == route)
    }

    pub fn all() -> &'static [Self] {
        &PAGES
    }

    pub fn offers(&self, action: PageAction) -> bool {
        self.actions.contains(&action)
    }
}
