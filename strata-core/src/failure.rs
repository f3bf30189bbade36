//! Typed lookup failures.
//!
//! Every failure a store can report is one of a closed set of kinds, tagged
//! with the identity of the store that raised it. Recovery policy dispatches
//! on (store, kind), never on failure presence alone.

use crate::{LookupKey, StoreId, StoreValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a store query or a whole pipeline run.
pub type LookupResult = Result<StoreValue, Failure>;

/// A typed failure reported by a backing store.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Failure {
    /// The store is unreachable. Transient, store-external.
    #[error("store {store} is unreachable")]
    ConnectionProblem { store: StoreId },

    /// The store has no record for the attempted key.
    ///
    /// `key` is the key the store actually looked up, which may be a
    /// store-local remapped identifier rather than the caller's key.
    #[error("store {store} has no record for key {key}")]
    NotFound { store: StoreId, key: LookupKey },

    /// The store is mid-update and cannot currently answer. Transient,
    /// store-internal, distinct from `ConnectionProblem`.
    #[error("store {store} is synchronizing and cannot answer")]
    SynchronizationPending { store: StoreId },
}

/// Failure kind without payload, used for rule matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    ConnectionProblem,
    NotFound,
    SynchronizationPending,
}

impl Failure {
    /// The kind discriminant of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::ConnectionProblem { .. } => FailureKind::ConnectionProblem,
            Failure::NotFound { .. } => FailureKind::NotFound,
            Failure::SynchronizationPending { .. } => FailureKind::SynchronizationPending,
        }
    }

    /// Identity of the store that raised this failure.
    pub fn store(&self) -> &StoreId {
        match self {
            Failure::ConnectionProblem { store }
            | Failure::NotFound { store, .. }
            | Failure::SynchronizationPending { store } => store,
        }
    }

    /// The key the failing store attempted, if the failure carries one.
    ///
    /// Only `NotFound` carries a key. It may differ from the caller's key
    /// when the store remaps identifiers internally.
    pub fn carried_key(&self) -> Option<&LookupKey> {
        match self {
            Failure::NotFound { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Whether the failure is transient (retrying later may succeed).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Failure::ConnectionProblem { .. } | Failure::SynchronizationPending { .. }
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
