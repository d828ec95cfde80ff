use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ModelError;

/// Characters the store refuses inside a single path segment.
const RESERVED: &[char] = &['/', '.', '#', '$', '[', ']'];

fn validate(raw: &str) -> Result<(), ModelError> {
    if raw.is_empty() {
        return Err(ModelError::EmptyId);
    }
    if raw.contains(RESERVED) {
        return Err(ModelError::InvalidId(raw.to_owned()));
    }
    Ok(())
}

/// Fresh identifier for store-side keys: 32 lowercase hex characters, no `_`.
fn generated() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Identifier of a user account (the auth provider's uid).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a new `UserId`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the id is empty or holds a reserved path character.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a day-specific custom category.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(String);

impl CategoryId {
    /// Creates a new `CategoryId`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the id is empty or holds a reserved path character.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    /// Generates a new random id that never contains `_`.
    #[must_use]
    pub fn generate() -> Self {
        Self(generated())
    }

    /// Wraps a key read back from the store without validation.
    pub(crate) fn from_stored(id: &str) -> Self {
        Self(id.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a task inside a custom or fixed category.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new `TaskId`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the id is empty or holds a reserved path character.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    /// Generates a new random id that never contains `_`.
    #[must_use]
    pub fn generate() -> Self {
        Self(generated())
    }

    pub(crate) fn from_stored(id: &str) -> Self {
        Self(id.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CategoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryId({})", self.0)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_reserved_ids() {
        assert_eq!(UserId::new(""), Err(ModelError::EmptyId));
        assert!(matches!(
            CategoryId::new("a/b"),
            Err(ModelError::InvalidId(_))
        ));
        assert!(TaskId::new("t.1").is_err());
        assert!(TaskId::new("t-1").is_ok());
    }

    #[test]
    fn generated_ids_have_no_underscore() {
        for _ in 0..16 {
            assert!(!CategoryId::generate().as_str().contains('_'));
            assert!(!TaskId::generate().as_str().contains('_'));
        }
    }
}
