//! STRATA Storage - Store Trait and Tiered Lookup
//!
//! Defines the store abstraction the lookup pipeline queries, in-memory
//! store implementations, and the `TieredLookup` orchestrator that applies
//! a declarative recovery policy to typed store failures.

pub mod memory;
pub mod pipeline;

pub use memory::{MemoryStore, UnreachableStore};
pub use pipeline::{PipelineConfigError, RecoveryPipeline, TieredLookup, TieredLookupBuilder};

use strata_core::{LookupKey, LookupResult, StoreId};

/// A backing store consulted by the lookup pipeline.
///
/// A store answers a single best-effort query: it returns a value or one of
/// the typed failures in `strata_core::Failure`, tagged with its own
/// identity. The closed failure enum guarantees a store can never hand the
/// pipeline an uncategorized failure. Retry, timeout, and backoff are the
/// store's own concern; the pipeline never retries an invocation.
pub trait Store: Send + Sync {
    /// Identity of this store, as it appears in failures and recovery rules.
    fn id(&self) -> StoreId;

    /// Look up a value by key.
    fn find_by_id(&self, key: &LookupKey) -> LookupResult;
}
