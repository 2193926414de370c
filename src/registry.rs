//! Opaque handles for host environments.
//!
//! The host never holds a native reference, only a [`Handle`]. Handles are
//! minted from a monotonically increasing counter and never reused, so a
//! stale handle is reported as [`Error::InvalidHandle`] instead of silently
//! aliasing a newer store.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{Error, Result, Store};

/// An opaque token naming one registered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Wraps a raw token received from the host.
    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    /// The raw token handed to the host.
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps handles to live values.
///
/// `resolve` takes a shared lock and returns a clone of the entry's `Arc`,
/// so no lock is held while the caller works with the value. Registration
/// changes take the exclusive lock.
pub struct HandleRegistry<T> {
    entries: RwLock<HashMap<Handle, Arc<T>>>,
    next: AtomicU64,
}

impl<T> HandleRegistry<T> {
    /// Creates an empty registry. The first handle minted is 1.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Takes ownership of `value` and returns its new handle.
    pub fn register(&self, value: T) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(handle, Arc::new(value));
        log::debug!("Registered handle {}", handle);
        handle
    }

    /// Looks up a live value.
    pub fn resolve(&self, handle: Handle) -> Result<Arc<T>> {
        self.entries
            .read()
            .get(&handle)
            .cloned()
            .ok_or(Error::InvalidHandle(handle.0.into()))
    }

    /// Removes the mapping and hands the value back to the caller.
    pub fn unregister(&self, handle: Handle) -> Result<Arc<T>> {
        let value = self
            .entries
            .write()
            .remove(&handle)
            .ok_or(Error::InvalidHandle(handle.0.into()))?;
        log::debug!("Unregistered handle {}", handle);
        Ok(value)
    }

    /// Whether `handle` is currently live.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.read().contains_key(&handle)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no handles are live.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T> Default for HandleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry<Store> {
    /// Unregisters and closes the store behind `handle`.
    pub fn destroy(&self, handle: Handle) -> Result<()> {
        let store = self.unregister(handle)?;
        store.close();
        Ok(())
    }

    /// Unregisters and closes every live store.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.entries.write().drain().collect();
        for (handle, store) in drained {
            store.close();
            log::debug!("Closed handle {}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_resolve() {
        let registry = HandleRegistry::new();
        let a = registry.register("a");
        let b = registry.register("b");

        assert_ne!(a, b);
        assert_eq!(*registry.resolve(a).unwrap(), "a");
        assert_eq!(*registry.resolve(b).unwrap(), "b");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_invalidates_handle() {
        let registry = HandleRegistry::new();
        let handle = registry.register(7u32);

        assert_eq!(*registry.unregister(handle).unwrap(), 7);
        assert!(!registry.contains(handle));
        assert!(matches!(registry.resolve(handle), Err(Error::InvalidHandle(_))));
        assert!(matches!(registry.unregister(handle), Err(Error::InvalidHandle(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handles_are_never_reused() {
        let registry = HandleRegistry::new();
        let first = registry.register(1);
        registry.unregister(first).unwrap();

        let second = registry.register(2);
        assert_ne!(first, second);
        assert!(second > first);
        assert!(registry.resolve(first).is_err());
    }

    #[test]
    fn test_unknown_handle() {
        let registry: HandleRegistry<()> = HandleRegistry::new();
        let err = registry.resolve(Handle::from_raw(99)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid handle: 99");
    }

    #[test]
    fn test_resolve_does_not_hold_lock() {
        let registry = HandleRegistry::new();
        let handle = registry.register(String::from("store"));

        let held = registry.resolve(handle).unwrap();
        // Unregistering while a resolved reference is alive must not block.
        let removed = registry.unregister(handle).unwrap();
        assert!(Arc::ptr_eq(&held, &removed));
    }
}
