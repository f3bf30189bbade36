//! Recovery policy as data.
//!
//! A recovery policy is an ordered list of rules, each mapping a failure
//! pattern (store + kind) to a remedial action. Rules are plain serde-able
//! values: a policy can be constructed in code, inspected, or loaded from
//! configuration. Evaluation order and matching semantics live in
//! strata-storage's pipeline, not here.

use crate::{Failure, FailureKind, LookupKey, StoreId, StoreValue};
use serde::{Deserialize, Serialize};

/// Pattern a failure must match for a rule to apply.
///
/// Matches on the raising store's identity and the failure kind; payloads
/// (such as the attempted key) do not participate in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub store: StoreId,
    pub kind: FailureKind,
}

impl FailurePattern {
    /// Create a pattern for the given store and kind.
    pub fn new(store: impl Into<StoreId>, kind: FailureKind) -> Self {
        FailurePattern {
            store: store.into(),
            kind,
        }
    }

    /// Whether the given failure matches this pattern.
    pub fn matches(&self, failure: &Failure) -> bool {
        failure.store() == &self.store && failure.kind() == self.kind
    }
}

/// How a delegation derives the key it queries with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeySelector {
    /// Use the key attached to the triggering failure (the identifier the
    /// failing store actually attempted). Falls back to the caller's
    /// original key when the failure carries none.
    #[default]
    Carried,
    /// Always use the caller's original key.
    Original,
}

impl KeySelector {
    /// Resolve the delegation key from the triggering failure and the
    /// caller's original key.
    pub fn select<'a>(&self, failure: &'a Failure, original: &'a LookupKey) -> &'a LookupKey {
        match self {
            KeySelector::Carried => failure.carried_key().unwrap_or(original),
            KeySelector::Original => original,
        }
    }
}

/// Remedial action a rule applies to a matching failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    /// Replace the failure with a fixed success value. No store is consulted.
    Substitute(StoreValue),
    /// Re-issue the lookup against another store with the selected key. The
    /// delegated call's outcome becomes the current result and continues
    /// through the remaining rules.
    Delegate { store: StoreId, key: KeySelector },
    /// Leave the failure unchanged; later rules may still match it.
    Propagate,
}

/// A single declarative recovery rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRule {
    pub pattern: FailurePattern,
    pub action: RecoveryAction,
}

impl RecoveryRule {
    /// Create a rule from a pattern and an action.
    pub fn new(pattern: FailurePattern, action: RecoveryAction) -> Self {
        RecoveryRule { pattern, action }
    }

    /// Rule that substitutes a fixed value for a matching failure.
    pub fn substitute(
        store: impl Into<StoreId>,
        kind: FailureKind,
        value: impl Into<StoreValue>,
    ) -> Self {
        RecoveryRule::new(
            FailurePattern::new(store, kind),
            RecoveryAction::Substitute(value.into()),
        )
    }

    /// Rule that delegates a matching failure to another store.
    pub fn delegate(
        store: impl Into<StoreId>,
        kind: FailureKind,
        target: impl Into<StoreId>,
        key: KeySelector,
    ) -> Self {
        RecoveryRule::new(
            FailurePattern::new(store, kind),
            RecoveryAction::Delegate {
                store: target.into(),
                key,
            },
        )
    }

    /// Rule that explicitly leaves a matching failure unchanged.
    pub fn propagate(store: impl Into<StoreId>, kind: FailureKind) -> Self {
        RecoveryRule::new(FailurePattern::new(store, kind), RecoveryAction::Propagate)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_store_and_kind() {
        let pattern = FailurePattern::new("cache", FailureKind::NotFound);

        assert!(pattern.matches(&Failure::NotFound {
            store: StoreId::from_static("cache"),
            key: LookupKey::Numeric(1),
        }));
        // Same kind, different store.
        assert!(!pattern.matches(&Failure::NotFound {
            store: StoreId::from_static("database"),
            key: LookupKey::Numeric(1),
        }));
        // Same store, different kind.
        assert!(!pattern.matches(&Failure::SynchronizationPending {
            store: StoreId::from_static("cache"),
        }));
    }

    #[test]
    fn test_key_selector_prefers_carried_key() {
        let original = LookupKey::Numeric(2);
        let failure = Failure::NotFound {
            store: StoreId::from_static("cache"),
            key: LookupKey::Numeric(102),
        };
        assert_eq!(
            KeySelector::Carried.select(&failure, &original),
            &LookupKey::Numeric(102)
        );
        assert_eq!(
            KeySelector::Original.select(&failure, &original),
            &original
        );
    }

    #[test]
    fn test_key_selector_falls_back_without_carried_key() {
        let original = LookupKey::Numeric(5);
        let failure = Failure::ConnectionProblem {
            store: StoreId::from_static("cache"),
        };
        assert_eq!(KeySelector::Carried.select(&failure, &original), &original);
    }

    #[test]
    fn test_policy_roundtrips_through_json() {
        let rules = vec![
            RecoveryRule::substitute(
                "cache",
                FailureKind::SynchronizationPending,
                "try again later",
            ),
            RecoveryRule::delegate(
                "cache",
                FailureKind::NotFound,
                "database",
                KeySelector::Carried,
            ),
            RecoveryRule::propagate("database", FailureKind::NotFound),
        ];

        let json = serde_json::to_string(&rules).expect("serialize policy");
        let back: Vec<RecoveryRule> = serde_json::from_str(&json).expect("deserialize policy");
        assert_eq!(rules, back);
    }
}
