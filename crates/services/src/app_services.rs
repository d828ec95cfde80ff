use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::admin_service::AdminService;
use crate::error::AppServicesError;
use crate::profile_service::ProfileService;
use crate::tracker_service::TrackerService;

/// Assembles the app-facing services over one store.
#[derive(Clone)]
pub struct AppServices {
    tracker: Arc<TrackerService>,
    profiles: Arc<ProfileService>,
    admin: Arc<AdminService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        tracing::info!(db = db_url, "sqlite storage ready");
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            tracker: Arc::new(TrackerService::new(clock, Arc::clone(&storage.activity))),
            profiles: Arc::new(ProfileService::new(clock, Arc::clone(&storage.activity))),
            admin: Arc::new(AdminService::new(clock, Arc::clone(&storage.activity))),
        }
    }

    #[must_use]
    pub fn tracker(&self) -> Arc<TrackerService> {
        Arc::clone(&self.tracker)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::model::{TaskKey, UserId};
    use tracker_core::time::fixed_clock;

    #[tokio::test]
    async fn services_share_one_store() {
        let services = AppServices::in_memory(fixed_clock());
        let user = UserId::new("u1").unwrap();
        let today = services.tracker().today();

        services
            .profiles()
            .register(&user, "sam", "sam@example.com")
            .await
            .unwrap();
        services
            .tracker()
            .set_task_status(&user, today, &TaskKey::new("walk").unwrap(), true)
            .await
            .unwrap();

        let summary = services.profiles().progress_summary(&user).await;
        assert_eq!(summary.completed_days, 1);
        assert_eq!(summary.current_streak, 1);
    }
}
