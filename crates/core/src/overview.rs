//! Cross-user statistics for the admin dashboard.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::aggregate::{ProgressSummary, compute_user_lifetime_progress};
use crate::model::{UserId, UserRecord};
use crate::time::CalendarDate;

pub const ACTIVE_USER_DAYS: u32 = 5;
pub const VERY_ACTIVE_USER_DAYS: u32 = 15;

/// Engagement bucket derived from lifetime completed days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl ActivityLevel {
    #[must_use]
    pub fn from_completed_days(days: u32) -> Self {
        match days {
            15.. => ActivityLevel::Excellent,
            10..=14 => ActivityLevel::VeryGood,
            5..=9 => ActivityLevel::Good,
            1..=4 => ActivityLevel::Fair,
            0 => ActivityLevel::Poor,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Excellent => "excellent",
            ActivityLevel::VeryGood => "very-good",
            ActivityLevel::Good => "good",
            ActivityLevel::Fair => "fair",
            ActivityLevel::Poor => "poor",
        }
    }
}

/// One line of the admin user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgressRow {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
    pub join_date: Option<DateTime<Utc>>,
    pub summary: ProgressSummary,
    pub activity_level: ActivityLevel,
}

impl UserProgressRow {
    #[must_use]
    pub fn from_record(record: &UserRecord, today: CalendarDate) -> Self {
        let summary = compute_user_lifetime_progress(&record.tracker, today);
        Self {
            user_id: record.id.clone(),
            display_name: record.profile.display_name().to_owned(),
            email: record.profile.email().to_owned(),
            is_admin: record.profile.is_admin(),
            join_date: record.profile.join_date(),
            activity_level: ActivityLevel::from_completed_days(summary.completed_days),
            summary,
        }
    }
}

/// Dashboard header totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminOverview {
    pub total_users: u32,
    pub active_users: u32,
    pub very_active_users: u32,
    /// Users whose join date falls in today's month.
    pub new_users: u32,
    pub total_activities: u32,
}

/// Rows for every user except the requester, most completed days first.
#[must_use]
pub fn compute_user_rows(
    records: &[UserRecord],
    requester: &UserId,
    today: CalendarDate,
) -> Vec<UserProgressRow> {
    let mut rows: Vec<UserProgressRow> = records
        .iter()
        .filter(|record| &record.id != requester)
        .map(|record| UserProgressRow::from_record(record, today))
        .collect();
    rows.sort_by(|a, b| {
        b.summary
            .completed_days
            .cmp(&a.summary.completed_days)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    rows
}

/// Totals over the rows, leaving out admins and the requester.
#[must_use]
pub fn compute_admin_overview(
    rows: &[UserProgressRow],
    requester: &UserId,
    today: CalendarDate,
) -> AdminOverview {
    let mut overview = AdminOverview::default();
    for row in rows {
        if row.is_admin || &row.user_id == requester {
            continue;
        }
        overview.total_users += 1;
        let joined_this_month = row.join_date.is_some_and(|joined| {
            joined.year() == today.year() && joined.month0() == today.month_index()
        });
        if joined_this_month {
            overview.new_users += 1;
        }
        if row.summary.completed_days >= ACTIVE_USER_DAYS {
            overview.active_users += 1;
        }
        if row.summary.completed_days >= VERY_ACTIVE_USER_DAYS {
            overview.very_active_users += 1;
        }
        overview.total_activities += row.summary.total_activities;
    }
    overview
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn completed_days(count: u32) -> Value {
        let mut days = Map::new();
        for day in 1..=count {
            days.insert(format!("day{day}"), json!({ "a": true }));
        }
        json!({ "2024": { "0": Value::Object(days) } })
    }

    fn records() -> Vec<UserRecord> {
        UserRecord::all_from_value(&json!({
            "admin": { "username": "root", "isAdmin": true, "tracker": completed_days(20) },
            "busy": {
                "username": "busy",
                "joinDate": "2024-03-02T10:00:00.000Z",
                "tracker": completed_days(16)
            },
            "steady": { "username": "steady", "joinDate": "2023-01-01T00:00:00.000Z", "tracker": completed_days(6) },
            "idle": { "email": "idle@example.com" }
        }))
    }

    fn today() -> CalendarDate {
        CalendarDate::new(2024, 2, 20).unwrap()
    }

    #[test]
    fn activity_level_thresholds() {
        assert_eq!(ActivityLevel::from_completed_days(0), ActivityLevel::Poor);
        assert_eq!(ActivityLevel::from_completed_days(1), ActivityLevel::Fair);
        assert_eq!(ActivityLevel::from_completed_days(5), ActivityLevel::Good);
        assert_eq!(ActivityLevel::from_completed_days(10), ActivityLevel::VeryGood);
        assert_eq!(ActivityLevel::from_completed_days(15).as_str(), "excellent");
    }

    #[test]
    fn rows_skip_requester_and_sort_by_completed_days() {
        let requester = UserId::new("steady").unwrap();
        let rows = compute_user_rows(&records(), &requester, today());
        let ids: Vec<&str> = rows.iter().map(|row| row.user_id.as_str()).collect();
        assert_eq!(ids, vec!["admin", "busy", "idle"]);
        assert_eq!(rows[2].display_name, "idle");
        assert_eq!(rows[2].activity_level, ActivityLevel::Poor);
    }

    #[test]
    fn overview_excludes_admins_and_requester() {
        let requester = UserId::new("admin").unwrap();
        let rows = compute_user_rows(&records(), &requester, today());
        let overview = compute_admin_overview(&rows, &requester, today());
        assert_eq!(
            overview,
            AdminOverview {
                total_users: 3,
                active_users: 2,
                very_active_users: 1,
                new_users: 1,
                total_activities: 22,
            }
        );
    }
}
