mod day;
mod fixed;
mod ids;
mod task_key;
mod tracker;
mod user;

pub use day::{CustomCategory, CustomTask, DayRecord};
pub use fixed::{FixedCategory, FixedTaskCatalog};
pub use ids::{CategoryId, TaskId, UserId};
pub use task_key::{CATEGORIES_KEY, CUSTOM_PREFIX, TaskKey, TaskKeyError};
pub use tracker::{DAY_KEY_PREFIX, MonthRecord, UserTracker, YearRecord, day_key, parse_day_key};
pub use user::{FIXED_TASKS_KEY, TRACKER_KEY, UserProfile, UserRecord};
