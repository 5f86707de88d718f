//! Listener type and the ordered listener registry
//!
//! Listeners are reference-counted closures. Identity (the `Arc` allocation)
//! is what `off` matches on, so keep the `Listener` you registered if you
//! intend to remove it later.

use crate::context::EventContext;
use crate::error::Result;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A registered event listener
///
/// Every listener is async at the type level; synchronous listeners return
/// an already-completed future (see [`sync_listener`]).
pub type Listener = Arc<dyn Fn(EventContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`Listener`]
pub fn listener<F, Fut>(f: F) -> Listener
where
    F: Fn(EventContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| -> BoxFuture<'static, Result<()>> { Box::pin(f(ctx)) })
}

/// Wrap a synchronous closure as a [`Listener`]
pub fn sync_listener<F>(f: F) -> Listener
where
    F: Fn(&EventContext) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |ctx| -> BoxFuture<'static, Result<()>> {
        let result = f(&ctx);
        Box::pin(futures::future::ready(result))
    })
}

/// Whether two handles are the same registered listener
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Event name → ordered listeners
///
/// Locks are held only for the duration of a single registry call, never
/// across an `.await`, so listeners may register or remove listeners while
/// an emission is in progress.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Listener>>> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Listener>>> {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a listener, returning the new listener count for `event`
    pub fn add(&self, event: &str, listener: Listener) -> usize {
        let mut listeners = self.write();
        let list = listeners.entry(event.to_string()).or_default();
        list.push(listener);
        list.len()
    }

    /// Remove every registration of `listener` under `event`
    ///
    /// Returns how many registrations were removed (0 for unknown listeners).
    pub fn remove(&self, event: &str, listener: &Listener) -> usize {
        let mut listeners = self.write();
        let Some(list) = listeners.get_mut(event) else {
            return 0;
        };

        let before = list.len();
        list.retain(|registered| !same_listener(registered, listener));
        let removed = before - list.len();

        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Copy of the listeners for `event`, in registration order
    pub fn snapshot(&self, event: &str) -> Vec<Listener> {
        self.read().get(event).cloned().unwrap_or_default()
    }

    /// Number of listeners registered for `event`
    pub fn count(&self, event: &str) -> usize {
        self.read().get(event).map_or(0, Vec::len)
    }

    /// Event names with at least one listener, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove all listeners for `event`
    pub fn clear(&self, event: &str) {
        self.write().remove(event);
    }

    /// Remove all listeners for every event
    pub fn clear_all(&self) {
        self.write().clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<String, usize> = self
            .read()
            .iter()
            .map(|(event, list)| (event.clone(), list.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}
