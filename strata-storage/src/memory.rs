//! In-memory store implementations.

use std::collections::HashMap;

use strata_core::{Failure, LockExecutor, LockPoisoned, LookupKey, LookupResult, StoreId, StoreValue};

use crate::Store;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<LookupKey, StoreValue>,
    /// Caller key -> store-local key. Misses are reported under the
    /// store-local key, which is what delegation picks up.
    remap: HashMap<LookupKey, LookupKey>,
}

/// In-memory store backed by a hash map behind a [`LockExecutor`].
///
/// Reads never block on a concurrent refresh: while a writer holds the lock
/// the store answers `SynchronizationPending`, so a reader can never observe
/// a partially applied refresh.
#[derive(Debug)]
pub struct MemoryStore {
    id: StoreId,
    state: LockExecutor<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store with the given identity.
    pub fn new(id: impl Into<StoreId>) -> Self {
        MemoryStore {
            id: id.into(),
            state: LockExecutor::new(MemoryState::default()),
        }
    }

    /// Create a store pre-populated with records.
    pub fn with_records<K, V>(
        id: impl Into<StoreId>,
        records: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<LookupKey>,
        V: Into<StoreValue>,
    {
        let state = MemoryState {
            records: records
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            remap: HashMap::new(),
        };
        MemoryStore {
            id: id.into(),
            state: LockExecutor::new(state),
        }
    }

    /// Remap a caller key to a store-local key.
    ///
    /// Lookups for `from` are answered from the record stored under `to`,
    /// and a miss is reported as `NotFound` carrying `to`.
    pub fn with_remap(mut self, from: impl Into<LookupKey>, to: impl Into<LookupKey>) -> Self {
        let state = self
            .state
            .get_mut()
            .expect("exclusively owned store cannot hold a poisoned lock");
        state.remap.insert(from.into(), to.into());
        self
    }

    /// Insert or replace a single record.
    pub fn insert(
        &self,
        key: impl Into<LookupKey>,
        value: impl Into<StoreValue>,
    ) -> Result<(), LockPoisoned> {
        let (key, value) = (key.into(), value.into());
        self.state.write(|state| {
            state.records.insert(key, value);
        })
    }

    /// Mutate the record set under the write lock.
    ///
    /// Readers arriving while `action` runs observe `SynchronizationPending`
    /// rather than waiting on a half-applied update.
    pub fn refresh<R>(
        &self,
        action: impl FnOnce(&mut HashMap<LookupKey, StoreValue>) -> R,
    ) -> Result<R, LockPoisoned> {
        self.state.write(|state| action(&mut state.records))
    }
}

impl Store for MemoryStore {
    fn id(&self) -> StoreId {
        self.id.clone()
    }

    fn find_by_id(&self, key: &LookupKey) -> LookupResult {
        let outcome = self.state.try_read(|state| {
            let attempted = state.remap.get(key).unwrap_or(key);
            match state.records.get(attempted) {
                Some(value) => Ok(value.clone()),
                None => Err(Failure::NotFound {
                    store: self.id.clone(),
                    key: attempted.clone(),
                }),
            }
        });

        match outcome {
            Ok(Some(result)) => result,
            // A writer holds the lock: the store is mid-update.
            Ok(None) => Err(Failure::SynchronizationPending {
                store: self.id.clone(),
            }),
            // Poisoned state is unusable; present the store as unreachable
            // rather than leaking an untyped failure into the pipeline.
            Err(_) => Err(Failure::ConnectionProblem {
                store: self.id.clone(),
            }),
        }
    }
}

/// A store that is always unreachable. Models a downed backend.
#[derive(Debug, Clone)]
pub struct UnreachableStore {
    id: StoreId,
}

impl UnreachableStore {
    /// Create an unreachable store with the given identity.
    pub fn new(id: impl Into<StoreId>) -> Self {
        UnreachableStore { id: id.into() }
    }
}

impl Store for UnreachableStore {
    fn id(&self) -> StoreId {
        self.id.clone()
    }

    fn find_by_id(&self, _key: &LookupKey) -> LookupResult {
        Err(Failure::ConnectionProblem {
            store: self.id.clone(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
