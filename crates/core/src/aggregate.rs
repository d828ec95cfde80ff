//! Month and lifetime aggregation over day progress.

use serde::Serialize;

use crate::model::{MonthRecord, UserTracker};
use crate::progress::{compute_day_progress, percent};
use crate::time::{CalendarDate, MonthKey};

/// How many trailing months `ProgressSummary::monthly_progress` keeps.
pub const MONTHLY_HISTORY_LEN: usize = 6;

/// Completion counts for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthProgress {
    pub completed_days: u32,
    /// Days with any record, not calendar days.
    pub total_days: u32,
    pub completion_rate: u8,
}

/// One point of the monthly completion series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyRate {
    pub month: MonthKey,
    pub completion_rate: u8,
}

/// Lifetime statistics for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed_days: u32,
    /// Sum of completed tasks over every recorded day.
    pub total_activities: u32,
    /// Completion rate of the current calendar month only.
    pub completion_rate: u8,
    /// Consecutive completed days ending at the most recent completed day.
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Latest day with at least one completed task.
    pub last_active_date: Option<CalendarDate>,
    /// Oldest first, at most [`MONTHLY_HISTORY_LEN`] entries.
    pub monthly_progress: Vec<MonthlyRate>,
}

/// Completed-day statistics for one month.
#[must_use]
pub fn compute_month_progress(month: &MonthRecord) -> MonthProgress {
    let mut completed_days = 0_u32;
    let mut total_days = 0_u32;
    for (_, day) in month.days() {
        total_days += 1;
        if compute_day_progress(day).is_complete() {
            completed_days += 1;
        }
    }
    MonthProgress {
        completed_days,
        total_days,
        completion_rate: percent(completed_days, total_days),
    }
}

/// Streak counts over chronologically ascending completed dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Folds ascending completed dates into current (trailing) and longest runs.
///
/// A date that does not directly follow the previous one starts a new run of 1.
#[must_use]
pub fn compute_streaks(dates: impl IntoIterator<Item = CalendarDate>) -> Streaks {
    let mut streaks = Streaks::default();
    let mut previous: Option<CalendarDate> = None;
    for date in dates {
        streaks.current = match previous {
            Some(prev) if prev.is_followed_by(date) => streaks.current + 1,
            _ => 1,
        };
        streaks.longest = streaks.longest.max(streaks.current);
        previous = Some(date);
    }
    streaks
}

/// Walks every recorded day of a user's history.
///
/// Day keys that do not name a real date in their month (e.g. `day30` in
/// February) still count towards totals but are skipped for streaks and the
/// last active date.
#[must_use]
pub fn compute_user_lifetime_progress(tracker: &UserTracker, today: CalendarDate) -> ProgressSummary {
    let mut summary = ProgressSummary::default();
    let mut completed_dates = Vec::new();
    let mut monthly = Vec::new();

    for (year, year_record) in tracker.years() {
        for (month_index, month) in year_record.months() {
            if month.is_empty() {
                continue;
            }
            for (day_number, day) in month.days() {
                let progress = compute_day_progress(day);
                let date = CalendarDate::checked(year, month_index, day_number);

                summary.total_activities += progress.completed_tasks;
                if progress.has_activity() && date.is_some() {
                    summary.last_active_date = summary.last_active_date.max(date);
                }
                if progress.is_complete() {
                    summary.completed_days += 1;
                    completed_dates.extend(date);
                }
            }

            let key = MonthKey::new(year, month_index);
            let month_progress = compute_month_progress(month);
            if key == today.month_key() {
                summary.completion_rate = month_progress.completion_rate;
            }
            monthly.push(MonthlyRate {
                month: key,
                completion_rate: month_progress.completion_rate,
            });
        }
    }

    let streaks = compute_streaks(completed_dates);
    summary.current_streak = streaks.current;
    summary.longest_streak = streaks.longest;

    let skip = monthly.len().saturating_sub(MONTHLY_HISTORY_LEN);
    summary.monthly_progress = monthly.split_off(skip);
    summary
}
