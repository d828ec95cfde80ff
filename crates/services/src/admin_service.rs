use std::sync::Arc;

use storage::StorePath;
use storage::repository::ActivityStore;
use tracker_core::model::{MonthRecord, UserId, UserProfile, UserRecord};
use tracker_core::{
    AdminOverview, Clock, UserProgressRow, compute_admin_overview, compute_user_rows,
};

use crate::error::AdminServiceError;
use crate::snapshot::read_or_empty;
use crate::tracker_service::MonthView;

/// Cross-user views, available to admins only.
#[derive(Clone)]
pub struct AdminService {
    clock: Clock,
    store: Arc<dyn ActivityStore>,
}

impl AdminService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn ActivityStore>) -> Self {
        Self { clock, store }
    }

    async fn require_admin(&self, requester: &UserId) -> Result<(), AdminServiceError> {
        let snapshot = self.store.get(&StorePath::user(requester)).await?;
        let is_admin = snapshot
            .as_ref()
            .is_some_and(|value| UserProfile::from_value(value).is_admin());
        if is_admin {
            Ok(())
        } else {
            tracing::warn!(user = %requester, "admin access denied");
            Err(AdminServiceError::AccessDenied(requester.clone()))
        }
    }

    async fn load_users(&self) -> Vec<UserRecord> {
        read_or_empty(self.store.as_ref(), &StorePath::users())
            .await
            .map(|users| UserRecord::all_from_value(&users))
            .unwrap_or_default()
    }

    /// One row per user other than the requester, most completed days first.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::AccessDenied` if `requester` is not an admin.
    pub async fn user_rows(
        &self,
        requester: &UserId,
    ) -> Result<Vec<UserProgressRow>, AdminServiceError> {
        self.require_admin(requester).await?;
        let users = self.load_users().await;
        Ok(compute_user_rows(&users, requester, self.clock.today()))
    }

    /// Dashboard totals over non-admin users.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::AccessDenied` if `requester` is not an admin.
    pub async fn overview(&self, requester: &UserId) -> Result<AdminOverview, AdminServiceError> {
        let rows = self.user_rows(requester).await?;
        let overview = compute_admin_overview(&rows, requester, self.clock.today());
        tracing::debug!(users = overview.total_users, "admin overview computed");
        Ok(overview)
    }

    /// Another user's calendar for the current month.
    ///
    /// # Errors
    ///
    /// Returns `AdminServiceError::AccessDenied` if `requester` is not an admin.
    pub async fn user_calendar(
        &self,
        requester: &UserId,
        user: &UserId,
    ) -> Result<MonthView, AdminServiceError> {
        self.require_admin(requester).await?;
        let today = self.clock.today();
        let month = today.month_key();
        let path = StorePath::month(user, month.year, month.month_index);
        let snapshot = read_or_empty(self.store.as_ref(), &path).await;
        let record = MonthRecord::from_snapshot(snapshot.as_ref());
        Ok(MonthView::build(month, &record, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage::repository::InMemoryStore;
    use tracker_core::time::fixed_clock;

    async fn seeded() -> AdminService {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(
                &StorePath::users(),
                json!({
                    "boss": { "username": "boss", "isAdmin": true },
                    "fake": { "username": "fake", "isAdmin": "yes" },
                    "amy": {
                        "username": "amy",
                        "joinDate": "2023-11-02T08:00:00.000Z",
                        "tracker": { "2023": { "10": { "day1": { "a": true }, "day2": { "a": false } } } }
                    }
                }),
            )
            .await
            .unwrap();
        AdminService::new(fixed_clock(), store)
    }

    #[tokio::test]
    async fn non_admins_are_denied() {
        let service = seeded().await;
        let fake = UserId::new("fake").unwrap();
        assert!(matches!(
            service.overview(&fake).await,
            Err(AdminServiceError::AccessDenied(_))
        ));
        let ghost = UserId::new("ghost").unwrap();
        assert!(service.user_rows(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn overview_and_rows_for_admin() {
        let service = seeded().await;
        let boss = UserId::new("boss").unwrap();

        let rows = service.user_rows(&boss).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|row| row.user_id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "fake"]);

        let overview = service.overview(&boss).await.unwrap();
        assert_eq!(
            overview,
            AdminOverview {
                total_users: 2,
                active_users: 0,
                very_active_users: 0,
                new_users: 1,
                total_activities: 1,
            }
        );
    }

    #[tokio::test]
    async fn user_calendar_uses_the_current_month() {
        let service = seeded().await;
        let boss = UserId::new("boss").unwrap();
        let amy = UserId::new("amy").unwrap();
        let view = service.user_calendar(&boss, &amy).await.unwrap();
        assert_eq!(view.month.to_string(), "2023-11");
        assert_eq!(view.progress.total_days, 2);
        assert_eq!(view.progress.completed_days, 1);
    }
}
