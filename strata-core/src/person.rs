//! Person value object with predicate-based classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Age at which a person counts as an adult.
pub const ADULT_AGE: u8 = 18;

/// A person, classified by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub age: u8,
}

impl Person {
    /// Create a person with the given age.
    pub fn new(age: u8) -> Self {
        Person { age }
    }

    /// Whether this person is an adult.
    pub fn is_adult(&self) -> bool {
        self.age >= ADULT_AGE
    }

    /// Classify this person as an adult, or report why not.
    pub fn into_adult(self) -> Result<Adult, NotAnAdultError> {
        if self.is_adult() {
            Ok(Adult(self))
        } else {
            Err(NotAnAdultError { age: self.age })
        }
    }
}

/// A person proven to be an adult.
///
/// Can only be obtained through [`Person::into_adult`], so holding one is
/// evidence the predicate passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adult(Person);

impl Adult {
    /// The underlying person.
    pub fn person(&self) -> &Person {
        &self.0
    }

    /// The adult's age.
    pub fn age(&self) -> u8 {
        self.0.age
    }
}

/// The person did not satisfy the adulthood predicate.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("person aged {age} is not an adult")]
pub struct NotAnAdultError {
    pub age: u8,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adulthood_boundary() {
        assert!(!Person::new(17).is_adult());
        assert!(Person::new(18).is_adult());
        assert!(Person::new(19).is_adult());
    }

    #[test]
    fn test_into_adult_succeeds_at_threshold() {
        let adult = Person::new(ADULT_AGE).into_adult().unwrap();
        assert_eq!(adult.age(), ADULT_AGE);
        assert_eq!(adult.person(), &Person::new(ADULT_AGE));
    }

    #[test]
    fn test_into_adult_reports_age() {
        let err = Person::new(12).into_adult().unwrap_err();
        assert_eq!(err, NotAnAdultError { age: 12 });
        assert_eq!(err.to_string(), "person aged 12 is not an adult");
    }
}
