//! STRATA Core - Lookup Data Types
//!
//! Pure data structures for the tiered lookup framework. All other crates
//! depend on this. This crate contains ONLY data types and small value
//! helpers - the lookup orchestration lives in strata-storage.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

pub mod failure;
pub mod lock;
pub mod person;
pub mod recovery;

pub use failure::{Failure, FailureKind, LookupResult};
pub use lock::{LockExecutor, LockPoisoned};
pub use person::{Adult, NotAnAdultError, Person, ADULT_AGE};
pub use recovery::{FailurePattern, KeySelector, RecoveryAction, RecoveryRule};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Successful lookup payload.
pub type StoreValue = String;

/// Opaque identifier used to query a store.
///
/// A store may index its records under identifiers of either shape; the
/// pipeline never interprets a key beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKey {
    /// Integer identifier (e.g., a row id).
    Numeric(i64),
    /// String identifier (e.g., a natural key).
    Text(String),
}

impl From<i64> for LookupKey {
    fn from(id: i64) -> Self {
        LookupKey::Numeric(id)
    }
}

impl From<&str> for LookupKey {
    fn from(id: &str) -> Self {
        LookupKey::Text(id.to_string())
    }
}

impl From<String> for LookupKey {
    fn from(id: String) -> Self {
        LookupKey::Text(id)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Numeric(id) => write!(f, "{}", id),
            LookupKey::Text(id) => write!(f, "{}", id),
        }
    }
}

/// Identity of a backing store, used to tag failures and match recovery
/// rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Cow<'static, str>);

impl StoreId {
    /// Create a store id from a static name. Usable in const contexts.
    pub const fn from_static(name: &'static str) -> Self {
        StoreId(Cow::Borrowed(name))
    }

    /// Create a store id from an owned name.
    pub fn new(name: impl Into<String>) -> Self {
        StoreId(Cow::Owned(name.into()))
    }

    /// The store name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for StoreId {
    fn from(name: &'static str) -> Self {
        StoreId::from_static(name)
    }
}

// ============================================================================
// TESTS
// ============================================================================
