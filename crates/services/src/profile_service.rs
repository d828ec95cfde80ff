use std::sync::Arc;

use serde_json::Value;
use storage::StorePath;
use storage::repository::{ActivityStore, PathUpdate};
use tracker_core::model::{UserId, UserProfile, UserTracker};
use tracker_core::{Clock, ProgressSummary, compute_user_lifetime_progress};

use crate::error::ProfileServiceError;
use crate::snapshot::read_or_empty;

/// Account lifecycle and per-user lifetime statistics.
#[derive(Clone)]
pub struct ProfileService {
    clock: Clock,
    store: Arc<dyn ActivityStore>,
}

impl ProfileService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn ActivityStore>) -> Self {
        Self { clock, store }
    }

    /// Writes a fresh profile for `user`, replacing anything stored for it.
    ///
    /// The tracker starts empty; an empty node is simply absent from the store.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Model` for an empty username, or storage errors.
    pub async fn register(
        &self,
        user: &UserId,
        username: &str,
        email: &str,
    ) -> Result<UserProfile, ProfileServiceError> {
        let profile = UserProfile::new(username, email, self.clock.now())?;
        self.store
            .set(&StorePath::user(user), profile.to_value())
            .await?;
        tracing::info!(user = %user, username = profile.username(), "user registered");
        Ok(profile)
    }

    /// Loads the profile, creating it from `email` on first sign-in and
    /// backfilling a missing join date.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the store cannot be read or written.
    pub async fn ensure_profile(
        &self,
        user: &UserId,
        email: &str,
    ) -> Result<UserProfile, ProfileServiceError> {
        let Some(existing) = self.store.get(&StorePath::user(user)).await? else {
            let username = email.split('@').next().unwrap_or_default();
            let username = if username.trim().is_empty() { user.as_str() } else { username };
            return self.register(user, username, email).await;
        };

        let mut profile = UserProfile::from_value(&existing);
        if profile.join_date().is_none() {
            let now = self.clock.now();
            profile.set_join_date(now);
            let joined = profile.to_value()["joinDate"].clone();
            self.store
                .update(PathUpdate::from([(
                    StorePath::profile_field(user, "joinDate"),
                    joined,
                )]))
                .await?;
            tracing::info!(user = %user, "join date backfilled");
        }
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotRegistered` if nothing is stored for `user`.
    pub async fn profile(&self, user: &UserId) -> Result<UserProfile, ProfileServiceError> {
        let snapshot = self
            .store
            .get(&StorePath::user(user))
            .await?
            .ok_or_else(|| ProfileServiceError::NotRegistered(user.clone()))?;
        Ok(UserProfile::from_value(&snapshot))
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::NotRegistered` for unknown users, or storage errors.
    pub async fn grant_admin(&self, user: &UserId) -> Result<(), ProfileServiceError> {
        self.profile(user).await?;
        self.store
            .set(&StorePath::profile_field(user, "isAdmin"), Value::Bool(true))
            .await?;
        tracing::info!(user = %user, "admin granted");
        Ok(())
    }

    /// Lifetime statistics; the completion rate covers the clock's current month.
    pub async fn progress_summary(&self, user: &UserId) -> ProgressSummary {
        let snapshot = read_or_empty(self.store.as_ref(), &StorePath::tracker(user)).await;
        let tracker = UserTracker::from_snapshot(snapshot.as_ref());
        compute_user_lifetime_progress(&tracker, self.clock.today())
    }

    /// Removes the profile, tracker and task definitions of `user`.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if the delete fails.
    pub async fn delete_account(&self, user: &UserId) -> Result<(), ProfileServiceError> {
        self.store.remove(&StorePath::user(user)).await?;
        tracing::info!(user = %user, "account deleted");
        Ok(())
    }
}
