use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CategoryId, TaskId};

/// Day-record field holding the custom category definitions; never a task.
pub const CATEGORIES_KEY: &str = "customCategories";

/// Prefix of synthesized keys for tasks that live inside a category.
pub const CUSTOM_PREFIX: &str = "custom_";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskKeyError {
    #[error("task key cannot be empty")]
    Empty,

    #[error("task key is reserved: {0}")]
    Reserved(String),

    #[error("task key contains a reserved character: {0}")]
    InvalidCharacter(String),

    #[error("custom task key has no category/task separator: {0}")]
    Malformed(String),

    /// A category or task id contains `_`, so the split point is not unique.
    #[error("custom task key is ambiguous: {0}")]
    Ambiguous(String),
}

/// Key of one boolean completion flag inside a day record.
///
/// Either a plain key (`morning`) or `custom_{categoryId}_{taskId}`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    /// Validates a key supplied by a caller.
    ///
    /// # Errors
    ///
    /// Returns `TaskKeyError` for empty keys, the reserved categories field,
    /// or characters that cannot appear in a store path segment.
    pub fn new(raw: impl Into<String>) -> Result<Self, TaskKeyError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(TaskKeyError::Empty);
        }
        if raw == CATEGORIES_KEY {
            return Err(TaskKeyError::Reserved(raw));
        }
        if raw.contains(['/', '.', '#', '$', '[', ']']) {
            return Err(TaskKeyError::InvalidCharacter(raw));
        }
        Ok(Self(raw))
    }

    /// Builds `custom_{category}_{task}`. Underscores inside either part are not escaped.
    #[must_use]
    pub fn custom(category: impl AsRef<str>, task: impl AsRef<str>) -> Self {
        Self(format!(
            "{CUSTOM_PREFIX}{}_{}",
            category.as_ref(),
            task.as_ref()
        ))
    }

    /// Wraps a key read back from a stored day record as-is.
    pub(crate) fn from_stored(raw: &str) -> Self {
        Self(raw.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.0.starts_with(CUSTOM_PREFIX)
    }

    /// Splits a custom key back into its category and task ids.
    ///
    /// Returns `Ok(None)` for plain keys. Keys are normally rebuilt from known ids
    /// instead of parsed; this exists for tooling that only has the raw key.
    ///
    /// # Errors
    ///
    /// `TaskKeyError::Malformed` when there is no separator, and
    /// `TaskKeyError::Ambiguous` when more than one split is possible.
    pub fn custom_parts(&self) -> Result<Option<(CategoryId, TaskId)>, TaskKeyError> {
        let Some(rest) = self.0.strip_prefix(CUSTOM_PREFIX) else {
            return Ok(None);
        };
        let mut pieces = rest.split('_');
        match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(category), Some(task), None) if !category.is_empty() && !task.is_empty() => {
                Ok(Some((
                    CategoryId::from_stored(category),
                    TaskId::from_stored(task),
                )))
            }
            (_, Some(_), Some(_)) => Err(TaskKeyError::Ambiguous(self.0.clone())),
            _ => Err(TaskKeyError::Malformed(self.0.clone())),
        }
    }
}

impl fmt::Debug for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskKey({})", self.0)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
