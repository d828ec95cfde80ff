//! Day-level progress: the single place where tasks are counted.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{DayRecord, TaskKey};

/// Task counts for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayProgress {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    /// Rounded share of completed tasks, `0..=100`; 0 when there are no tasks.
    pub percentage: u8,
}

impl DayProgress {
    /// A completed day has at least one task and every task done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_tasks > 0 && self.completed_tasks == self.total_tasks
    }

    #[must_use]
    pub fn has_activity(&self) -> bool {
        self.completed_tasks > 0
    }
}

/// Integer percentage of `part / whole`, rounded half up. Returns 0 when `whole` is 0.
#[must_use]
pub fn percent(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded).unwrap_or(100)
}

/// Counts tasks in a day record.
///
/// Every flag outside `customCategories` is one task. Every task defined in a
/// custom category is one task whether or not its flag exists; its flag is
/// not counted a second time as a plain key. Only a stored `true` is done.
#[must_use]
pub fn compute_day_progress(day: &DayRecord) -> DayProgress {
    let category_keys: Vec<TaskKey> = day
        .categories()
        .flat_map(|category| category.task_keys())
        .collect();
    let shadowed: BTreeSet<&TaskKey> = category_keys.iter().collect();

    let mut total_tasks = 0_u32;
    let mut completed_tasks = 0_u32;

    for (key, _) in day.flags() {
        if shadowed.contains(key) {
            continue;
        }
        total_tasks += 1;
        if day.is_completed(key) {
            completed_tasks += 1;
        }
    }

    for key in &category_keys {
        total_tasks += 1;
        if day.is_completed(key) {
            completed_tasks += 1;
        }
    }

    DayProgress {
        total_tasks,
        completed_tasks,
        percentage: percent(completed_tasks, total_tasks),
    }
}
