use thiserror::Error;

/// Validation failures for domain values built from user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("identifier cannot be empty")]
    EmptyId,

    #[error("identifier contains a reserved character: {0}")]
    InvalidId(String),

    #[error("not a calendar date: year {year}, month index {month_index}, day {day}")]
    InvalidDate {
        year: i32,
        month_index: u32,
        day: u32,
    },

    #[error("unknown fixed category: {0}")]
    UnknownFixedCategory(String),
}
