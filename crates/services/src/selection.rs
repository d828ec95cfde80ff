use std::sync::atomic::{AtomicU64, Ordering};

use tracker_core::{CalendarDate, MonthKey};

use crate::error::TrackerServiceError;

/// The month (and optionally the day) a viewer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub year: i32,
    pub month_index: u32,
    pub day: Option<u32>,
}

impl Selection {
    #[must_use]
    pub fn month(month: MonthKey) -> Self {
        Self {
            year: month.year,
            month_index: month.month_index,
            day: None,
        }
    }

    #[must_use]
    pub fn day(date: CalendarDate) -> Self {
        let month = date.month_key();
        Self {
            year: month.year,
            month_index: month.month_index,
            day: Some(date.day()),
        }
    }

    /// The selected date, if a day is selected and it exists in that month.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` for an impossible date.
    pub fn date(&self) -> Result<Option<CalendarDate>, TrackerServiceError> {
        match self.day {
            Some(day) => Ok(Some(CalendarDate::new(self.year, self.month_index, day)?)),
            None => Ok(None),
        }
    }
}

/// Proof that a load was started for a given selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
    selection: Selection,
}

impl SelectionTicket {
    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }
}

/// Drops results of loads that were overtaken by a newer selection.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    generation: AtomicU64,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new selection. Tickets from earlier selections become stale.
    pub fn select(&self, selection: Selection) -> SelectionTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        SelectionTicket {
            generation,
            selection,
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.generation
    }

    /// Returns `value` only if nothing was selected after `ticket` was issued.
    pub fn apply_if_current<T>(&self, ticket: &SelectionTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                generation = ticket.generation,
                year = ticket.selection.year,
                month = ticket.selection.month_index,
                "discarding stale result"
            );
            None
        }
    }
}
