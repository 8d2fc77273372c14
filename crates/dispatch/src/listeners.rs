//! Application-wide error interception
//!
//! An [`ErrorBus`] fans application errors out to registered listeners.
//! Registration returns a [`ListenerRegistration`]; dropping it removes the
//! listener, so a view that registers on mount cleans up on unmount without
//! an explicit call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::dispatcher::ErrorDispatcher;
use crate::error::HttpError;

/// An error that escaped the code that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppError {
    /// A failed request nobody handled.
    UnhandledRejection(HttpError),
    /// A synchronous failure outside any request.
    Uncaught {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl AppError {
    pub fn uncaught(message: impl Into<String>) -> Self {
        Self::Uncaught {
            message: message.into(),
            source: None,
        }
    }
}

pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: &AppError);
}

impl<F> ErrorListener for F
where
    F: Fn(&AppError) + Send + Sync,
{
    fn on_error(&self, error: &AppError) {
        self(error);
    }
}

type ListenerList = RwLock<Vec<(u64, Arc<dyn ErrorListener>)>>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    listeners: ListenerList,
}

/// Delivers [`AppError`]s to every registered listener.
#[derive(Clone, Default)]
pub struct ErrorBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for ErrorBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl ErrorBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener until the returned registration is dropped.
    pub fn register(&self, listener: impl ErrorListener + 'static) -> ListenerRegistration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, Arc::new(listener)));
        tracing::trace!(id, "error listener registered");
        ListenerRegistration {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `error` and returns how many listeners received it.
    ///
    /// Listeners run outside the registry lock, so they may register or
    /// drop registrations themselves.
    pub fn emit(&self, error: &AppError) -> usize {
        let listeners: Vec<Arc<dyn ErrorListener>> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        if listeners.is_empty() {
            tracing::warn!(?error, "application error with no listener");
        }
        for listener in &listeners {
            listener.on_error(error);
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

/// Keeps a listener registered. Dropping it deregisters the listener.
#[must_use = "dropping the registration removes the listener immediately"]
#[derive(Debug)]
pub struct ListenerRegistration {
    id: u64,
    bus: Weak<BusInner>,
}

impl ListenerRegistration {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.write().retain(|(id, _)| *id != self.id);
            tracing::trace!(id = self.id, "error listener removed");
        }
    }
}

/// Routes application errors through an [`ErrorDispatcher`].
///
/// Unhandled rejections go through the normal dispatch; uncaught errors go
/// straight to the generic error page.
#[derive(Debug, Clone)]
pub struct DispatchListener {
    dispatcher: Arc<ErrorDispatcher>,
}

impl DispatchListener {
    pub fn new(dispatcher: Arc<ErrorDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl ErrorListener for DispatchListener {
    fn on_error(&self, error: &AppError) {
        let result = match error {
            AppError::UnhandledRejection(http) => self.dispatcher.dispatch(http),
            AppError::Uncaught { message, source } => {
                self.dispatcher.dispatch_uncaught(message, source.as_deref())
            }
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "could not dispatch application error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryNavigator, MemoryStorage, StaticEnvironment};
    use crate::route::Route;
    use parking_lot::Mutex;

    #[test]
    fn registration_is_scoped() {
        let bus = ErrorBus::new();
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);

        {
            let _registration = bus.register(move |_: &AppError| *counter.lock() += 1);
            assert_eq!(bus.listener_count(), 1);
            assert_eq!(bus.emit(&AppError::uncaught("boom")), 1);
        }

        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.emit(&AppError::uncaught("boom")), 0);
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn registrations_are_independent() {
        let bus = ErrorBus::new();
        let first = bus.register(|_: &AppError| {});
        let second = bus.register(|_: &AppError| {});
        assert_ne!(first.id(), second.id());

        drop(first);
        assert_eq!(bus.listener_count(), 1);
        drop(second);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn registration_outliving_bus_is_harmless() {
        let bus = ErrorBus::new();
        let registration = bus.register(|_: &AppError| {});
        drop(bus);
        drop(registration);
    }

    #[test]
    fn dispatch_listener_routes_both_kinds() {
        let navigator = Arc::new(MemoryNavigator::new());
        let dispatcher = Arc::new(ErrorDispatcher::new(
            navigator.clone(),
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticEnvironment::default()),
        ));
        let bus = ErrorBus::new();
        let _registration = bus.register(DispatchListener::new(dispatcher));

        bus.emit(&AppError::UnhandledRejection(HttpError::status(403)));
        bus.emit(&AppError::Uncaught {
            message: "undefined is not a function".into(),
            source: None,
        });

        let routes: Vec<Route> = navigator.navigations().iter().map(|n| n.route).collect();
        assert_eq!(routes, vec![Route::Forbidden, Route::Generic]);
    }

    #[test]
    fn app_error_serializes_with_kind_tag() {
        let value = serde_json::to_value(AppError::uncaught("oops")).unwrap();
        assert_eq!(value, serde_json::json!({ "kind": "uncaught", "message": "oops" }));
    }
}
