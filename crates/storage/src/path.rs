use std::fmt;

use tracker_core::CalendarDate;
use tracker_core::model::{
    CATEGORIES_KEY, CategoryId, FIXED_TASKS_KEY, FixedCategory, TRACKER_KEY, TaskId, TaskKey,
    UserId, day_key,
};

use crate::repository::StorageError;

pub const USERS_KEY: &str = "users";

const RESERVED: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Slash-delimited address of a node in the activity tree.
///
/// The empty path is the root. Segments are never empty and never contain
/// `/ . # $ [ ]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a/b/c`. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for empty inner segments or reserved characters.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for segment in trimmed.split('/') {
            path = path.join(segment)?;
        }
        Ok(path)
    }

    /// Appends one segment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if the segment is empty or has reserved characters.
    pub fn join(&self, segment: impl AsRef<str>) -> Result<Self, StorageError> {
        let segment = segment.as_ref();
        if segment.is_empty() || segment.contains(RESERVED) {
            return Err(StorageError::InvalidPath(format!("{self}/{segment}")));
        }
        Ok(self.child(segment))
    }

    // Callers guarantee the segment is valid (validated ids and keys).
    fn child(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Every proper ancestor, nearest first, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = StorePath> + '_ {
        (0..self.segments.len()).rev().map(|len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// True if `self` equals `other` or lies above it.
    #[must_use]
    pub fn contains(&self, other: &StorePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True if one path contains the other.
    #[must_use]
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Segments of `other` below `self`, if `self` contains it.
    #[must_use]
    pub fn relative<'a>(&self, other: &'a StorePath) -> Option<&'a [String]> {
        other.segments.strip_prefix(self.segments.as_slice())
    }

    //
    // ─── TREE LAYOUT ───────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn users() -> Self {
        Self::root().child(USERS_KEY)
    }

    #[must_use]
    pub fn user(user: &UserId) -> Self {
        Self::users().child(user)
    }

    /// A scalar profile field such as `joinDate` or `isAdmin`.
    #[must_use]
    pub fn profile_field(user: &UserId, field: &'static str) -> Self {
        Self::user(user).child(field)
    }

    #[must_use]
    pub fn tracker(user: &UserId) -> Self {
        Self::user(user).child(TRACKER_KEY)
    }

    #[must_use]
    pub fn month(user: &UserId, year: i32, month_index: u32) -> Self {
        Self::tracker(user).child(year).child(month_index)
    }

    #[must_use]
    pub fn day(user: &UserId, date: CalendarDate) -> Self {
        Self::month(user, date.year(), date.month_index()).child(day_key(date.day()))
    }

    #[must_use]
    pub fn day_flag(user: &UserId, date: CalendarDate, key: &TaskKey) -> Self {
        Self::day(user, date).child(key)
    }

    #[must_use]
    pub fn day_category(user: &UserId, date: CalendarDate, category: &CategoryId) -> Self {
        Self::day(user, date).child(CATEGORIES_KEY).child(category)
    }

    #[must_use]
    pub fn day_category_task(
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
        task: &TaskId,
    ) -> Self {
        Self::day_category(user, date, category)
            .child("tasks")
            .child(task)
    }

    #[must_use]
    pub fn fixed_tasks(user: &UserId) -> Self {
        Self::user(user).child(FIXED_TASKS_KEY)
    }

    #[must_use]
    pub fn fixed_task(user: &UserId, category: FixedCategory, task: &TaskId) -> Self {
        Self::fixed_tasks(user).child(category).child(task)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
