#![forbid(unsafe_code)]

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod model;
pub mod overview;
pub mod progress;
pub mod time;

pub use aggregate::{
    MONTHLY_HISTORY_LEN, MonthProgress, MonthlyRate, ProgressSummary, Streaks,
    compute_month_progress, compute_streaks, compute_user_lifetime_progress,
};
pub use calendar::{CalendarCell, DayCell, ProgressClass, project_month};
pub use error::ModelError;
pub use overview::{
    ActivityLevel, AdminOverview, UserProgressRow, compute_admin_overview, compute_user_rows,
};
pub use progress::{DayProgress, compute_day_progress, percent};
pub use time::{CalendarDate, Clock, MonthKey};
