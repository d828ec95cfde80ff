use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::model::day::{clean_name, format_timestamp, str_field, timestamp_field};
use crate::model::fixed::FixedTaskCatalog;
use crate::model::ids::UserId;
use crate::model::tracker::UserTracker;

pub const TRACKER_KEY: &str = "tracker";
pub const FIXED_TASKS_KEY: &str = "customTasks";

/// Account metadata stored next to a user's tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    username: String,
    email: String,
    join_date: Option<DateTime<Utc>>,
    is_admin: bool,
}

impl UserProfile {
    /// Profile for a freshly registered, non-admin user.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::EmptyName` if the trimmed username is empty.
    pub fn new(username: &str, email: &str, joined: DateTime<Utc>) -> Result<Self, ModelError> {
        Ok(Self {
            username: clean_name(username)?,
            email: email.trim().to_owned(),
            join_date: Some(joined),
            is_admin: false,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn join_date(&self) -> Option<DateTime<Utc>> {
        self.join_date
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Name shown in listings: username, else the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.username.is_empty() {
            return &self.username;
        }
        self.email.split('@').next().unwrap_or_default()
    }

    pub fn set_join_date(&mut self, joined: DateTime<Utc>) {
        self.join_date = Some(joined);
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.is_admin = is_admin;
    }

    /// Decodes the profile fields of a `users/{uid}` node. `isAdmin` must be a strict `true`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            username: str_field(value, "username").unwrap_or_default(),
            email: str_field(value, "email").unwrap_or_default(),
            join_date: timestamp_field(value, "joinDate"),
            is_admin: matches!(value.get("isAdmin"), Some(Value::Bool(true))),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("username".into(), Value::String(self.username.clone()));
        map.insert("email".into(), Value::String(self.email.clone()));
        if let Some(joined) = self.join_date {
            map.insert("joinDate".into(), Value::String(format_timestamp(joined)));
        }
        map.insert("isAdmin".into(), Value::Bool(self.is_admin));
        Value::Object(map)
    }
}

/// Everything stored under one `users/{uid}` node.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub profile: UserProfile,
    pub tracker: UserTracker,
    pub fixed_tasks: FixedTaskCatalog,
}

impl UserRecord {
    #[must_use]
    pub fn from_value(id: UserId, value: &Value) -> Self {
        Self {
            id,
            profile: UserProfile::from_value(value),
            tracker: UserTracker::from_snapshot(value.get(TRACKER_KEY)),
            fixed_tasks: FixedTaskCatalog::from_snapshot(value.get(FIXED_TASKS_KEY)),
        }
    }

    /// Decodes the whole `users` node. Keys that are not valid user ids are skipped.
    #[must_use]
    pub fn all_from_value(value: &Value) -> Vec<Self> {
        value
            .as_object()
            .map(|users| {
                users
                    .iter()
                    .filter_map(|(uid, node)| {
                        UserId::new(uid.as_str())
                            .ok()
                            .map(|id| Self::from_value(id, node))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use serde_json::json;

    #[test]
    fn admin_flag_is_strict() {
        let loose = UserProfile::from_value(&json!({ "username": "a", "isAdmin": "true" }));
        assert!(!loose.is_admin());
        let strict = UserProfile::from_value(&json!({ "username": "a", "isAdmin": true }));
        assert!(strict.is_admin());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let profile = UserProfile::from_value(&json!({ "email": "sam@example.com" }));
        assert_eq!(profile.display_name(), "sam");
    }

    #[test]
    fn profile_round_trips_through_store_shape() {
        let profile = UserProfile::new(" sam ", "sam@example.com", fixed_now()).unwrap();
        assert_eq!(profile.username(), "sam");
        let value = profile.to_value();
        assert_eq!(value["isAdmin"], false);
        assert_eq!(UserProfile::from_value(&value), profile);
    }

    #[test]
    fn decodes_user_nodes_with_trackers() {
        let users = UserRecord::all_from_value(&json!({
            "u1": {
                "username": "one",
                "tracker": { "2024": { "2": { "day1": { "morning": true } } } },
                "customTasks": { "daily": { "1": { "name": "Walk" } } }
            },
            "u2": { "username": "two" }
        }));
        assert_eq!(users.len(), 2);
        assert!(users[0].tracker.month(2024, 2).is_some());
        assert!(!users[0].fixed_tasks.is_empty());
        assert!(users[1].tracker.is_empty());
    }
}
