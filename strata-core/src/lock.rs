//! Scoped-lock execution.
//!
//! `LockExecutor` runs a closure with a read or write lock held and releases
//! the lock on every exit path, including panics (RAII guards). A store
//! implementation that mutates shared state can wrap that state here;
//! `try_read` is the hook for reporting a synchronization window to
//! concurrent readers instead of blocking them on a partial view.

use std::sync::{RwLock, TryLockError};
use thiserror::Error;

/// A writer panicked while holding the lock; the protected state may be
/// inconsistent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("lock poisoned by a panicking writer")]
pub struct LockPoisoned;

/// Executes closures under a read/write lock with guaranteed release.
#[derive(Debug, Default)]
pub struct LockExecutor<T> {
    inner: RwLock<T>,
}

impl<T> LockExecutor<T> {
    /// Wrap a value for lock-scoped access.
    pub fn new(value: T) -> Self {
        LockExecutor {
            inner: RwLock::new(value),
        }
    }

    /// Run `action` with the read lock held.
    pub fn read<R>(&self, action: impl FnOnce(&T) -> R) -> Result<R, LockPoisoned> {
        let guard = self.inner.read().map_err(|_| LockPoisoned)?;
        Ok(action(&guard))
    }

    /// Run `action` with the write lock held.
    pub fn write<R>(&self, action: impl FnOnce(&mut T) -> R) -> Result<R, LockPoisoned> {
        let mut guard = self.inner.write().map_err(|_| LockPoisoned)?;
        Ok(action(&mut guard))
    }

    /// Run `action` with the read lock held, without blocking.
    ///
    /// Returns `Ok(None)` when a writer currently holds the lock.
    pub fn try_read<R>(&self, action: impl FnOnce(&T) -> R) -> Result<Option<R>, LockPoisoned> {
        match self.inner.try_read() {
            Ok(guard) => Ok(Some(action(&guard))),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Poisoned(_)) => Err(LockPoisoned),
        }
    }

    /// Access the protected value through exclusive ownership, without
    /// taking the lock.
    pub fn get_mut(&mut self) -> Result<&mut T, LockPoisoned> {
        self.inner.get_mut().map_err(|_| LockPoisoned)
    }

    /// Consume the executor and return the protected value.
    pub fn into_inner(self) -> Result<T, LockPoisoned> {
        self.inner.into_inner().map_err(|_| LockPoisoned)
    }
}

// ============================================================================
// TESTS
// ============================================================================
