//! # phoenix-dispatch
//!
//! Central handling of failures that escape a single view:
//!
//! - [`dispatcher`]: classifies HTTP errors and navigates to the matching
//!   error page (401 clears the session and redirects to `/login`)
//! - [`listeners`]: an [`ErrorBus`](listeners::ErrorBus) with scoped
//!   registrations that funnels unhandled errors into the dispatcher
//! - [`boundary`]: error boundaries for panels and a supervisor for workers
//! - [`pages`]: the fixed error page templates
//!
//! Routing, storage and the current location belong to the host and are
//! injected through the traits in [`host`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use phoenix_dispatch::prelude::*;
//!
//! let navigator = Arc::new(MemoryNavigator::new());
//! let dispatcher = ErrorDispatcher::new(
//!     navigator.clone(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(StaticEnvironment::new("/articles")),
//! );
//! dispatcher.dispatch(&HttpError::status(404))?;
//! assert_eq!(navigator.last().unwrap().route, Route::NotFound);
//! ```

pub mod boundary;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod listeners;
pub mod pages;
pub mod route;

pub mod prelude {
    pub use crate::boundary::{
        BoundaryState, CapturedFailure, ErrorBoundary, ErrorReporter, FallbackView, Rendered,
        RestartPolicy, Supervisor, SupervisorExit, WorkerOutcome,
    };
    pub use crate::dispatcher::{DispatchAction, DispatcherConfig, ErrorClass, ErrorDispatcher};
    pub use crate::error::{
        DispatchError, DispatchResult, HttpError, HttpResponse, NavigationError, RequestConfig,
        StorageError,
    };
    pub use crate::host::{
        Environment, MemoryNavigator, MemoryStorage, Navigator, StaticEnvironment, Storage,
    };
    pub use crate::listeners::{AppError, DispatchListener, ErrorBus, ErrorListener, ListenerRegistration};
    pub use crate::pages::{ErrorPage, PageAction};
    pub use crate::route::{Navigation, Route, UnknownRoute};
}
