//! Collaborators supplied by the host application
//!
//! The dispatcher does not own a router, a storage backend or a view of the
//! current location. Hosts inject them through these traits. In-memory
//! implementations are provided for tests and headless hosts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{NavigationError, StorageError};
use crate::route::Navigation;

/// Performs navigations.
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: Navigation) -> Result<(), NavigationError>;
}

/// Persisted key-value storage (local storage on the web).
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Where the client currently is and whether it is online.
pub trait Environment: Send + Sync {
    fn current_path(&self) -> String;
    fn is_online(&self) -> bool;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS
// ============================================================================

/// Records navigations instead of performing them.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Navigation>>,
    reject: AtomicBool,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following navigation fail.
    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.history.lock().clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.history.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.history.lock().len()
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, navigation: Navigation) -> Result<(), NavigationError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(NavigationError::Rejected {
                path: navigation.path().to_string(),
                reason: "navigator is rejecting".to_string(),
            });
        }
        self.history.lock().push(navigation);
        Ok(())
    }
}

/// Storage backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        storage
    }

    /// Simulates storage that refuses every operation (private browsing, disabled cookies).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// An environment whose path and connectivity are set by hand.
#[derive(Debug)]
pub struct StaticEnvironment {
    path: RwLock<String>,
    online: AtomicBool,
}

impl StaticEnvironment {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(path.into()),
            online: AtomicBool::new(true),
        }
    }

    pub fn set_path(&self, path: impl Into<String>) {
        *self.path.write() = path.into();
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Environment for StaticEnvironment {
    fn current_path(&self) -> String {
        self.path.read().clone()
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
