use std::sync::Arc;

use serde_json::Value;
use storage::repository::{ActivityStore, PathUpdate};
use storage::{StorePath, Subscription};
use tracker_core::model::{
    CategoryId, CustomCategory, CustomTask, DayRecord, FixedCategory, FixedTaskCatalog,
    MonthRecord, TaskId, TaskKey, UserId,
};
use tracker_core::{
    CalendarCell, CalendarDate, Clock, DayProgress, MonthKey, MonthProgress,
    compute_day_progress, compute_month_progress, project_month,
};

use crate::error::TrackerServiceError;
use crate::snapshot::read_or_empty;

/// Everything shown for one selected day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: CalendarDate,
    pub record: DayRecord,
    pub progress: DayProgress,
    pub fixed_tasks: FixedTaskCatalog,
}

/// Month statistics and the calendar grid built from the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub month: MonthKey,
    pub progress: MonthProgress,
    pub cells: Vec<CalendarCell>,
}

impl MonthView {
    pub(crate) fn build(month: MonthKey, record: &MonthRecord, today: CalendarDate) -> Self {
        Self {
            month,
            progress: compute_month_progress(record),
            cells: project_month(month.year, month.month_index, record, today),
        }
    }
}

/// Result of flipping one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub progress: DayProgress,
}

/// Reads and writes a user's tracker and feeds snapshots into progress math.
#[derive(Clone)]
pub struct TrackerService {
    clock: Clock,
    store: Arc<dyn ActivityStore>,
}

impl TrackerService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn ActivityStore>) -> Self {
        Self { clock, store }
    }

    #[must_use]
    pub fn today(&self) -> CalendarDate {
        self.clock.today()
    }

    async fn load_day(&self, user: &UserId, date: CalendarDate) -> DayRecord {
        let snapshot = read_or_empty(self.store.as_ref(), &StorePath::day(user, date)).await;
        DayRecord::from_snapshot(snapshot.as_ref())
    }

    async fn load_month(&self, user: &UserId, month: MonthKey) -> MonthRecord {
        let path = StorePath::month(user, month.year, month.month_index);
        let snapshot = read_or_empty(self.store.as_ref(), &path).await;
        MonthRecord::from_snapshot(snapshot.as_ref())
    }

    async fn load_category(
        &self,
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
    ) -> Result<CustomCategory, TrackerServiceError> {
        let snapshot = self
            .store
            .get(&StorePath::day_category(user, date, category))
            .await?
            .ok_or_else(|| TrackerServiceError::UnknownCategory(category.clone()))?;
        Ok(CustomCategory::from_value(category.clone(), &snapshot))
    }

    /// Marks one task done or not done and returns the day's new progress.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Storage` if the write fails.
    pub async fn set_task_status(
        &self,
        user: &UserId,
        date: CalendarDate,
        key: &TaskKey,
        completed: bool,
    ) -> Result<DayProgress, TrackerServiceError> {
        let updates = PathUpdate::from([(
            StorePath::day_flag(user, date, key),
            Value::Bool(completed),
        )]);
        self.store.update(updates).await?;
        tracing::debug!(user = %user, %date, task = %key, completed, "task status saved");
        Ok(compute_day_progress(&self.load_day(user, date).await))
    }

    /// Flips a task. A missing or non-`true` flag becomes `true`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Storage` if the write fails.
    pub async fn toggle_task(
        &self,
        user: &UserId,
        date: CalendarDate,
        key: &TaskKey,
    ) -> Result<ToggleOutcome, TrackerServiceError> {
        let completed = !self.load_day(user, date).await.is_completed(key);
        let progress = self.set_task_status(user, date, key, completed).await?;
        Ok(ToggleOutcome {
            completed,
            progress,
        })
    }

    /// Creates a category that exists only on `date`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` for an empty name, or storage errors.
    pub async fn create_category(
        &self,
        user: &UserId,
        date: CalendarDate,
        name: &str,
        icon: Option<&str>,
    ) -> Result<CategoryId, TrackerServiceError> {
        let category = CustomCategory::new(CategoryId::generate(), name, icon, self.clock.now())?;
        let path = StorePath::day_category(user, date, category.id());
        self.store.set(&path, category.definition_value()).await?;
        tracing::debug!(user = %user, %date, category = %category.id(), "category created");
        Ok(category.id().clone())
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::UnknownCategory` if the category is not on that day.
    pub async fn rename_category(
        &self,
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
        name: &str,
    ) -> Result<(), TrackerServiceError> {
        let existing = self.load_category(user, date, category).await?;
        let renamed = CustomCategory::new(
            category.clone(),
            name,
            existing.icon(),
            existing.created().unwrap_or_else(|| self.clock.now()),
        )?;
        let path = StorePath::day_category(user, date, category).join("name")?;
        self.store
            .update(PathUpdate::from([(path, Value::String(renamed.name().to_owned()))]))
            .await?;
        Ok(())
    }

    /// Removes a category and every completion flag of its tasks in one write.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::UnknownCategory` if the category is not on that day.
    pub async fn delete_category(
        &self,
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
    ) -> Result<(), TrackerServiceError> {
        let existing = self.load_category(user, date, category).await?;
        let mut updates = PathUpdate::new();
        updates.insert(StorePath::day_category(user, date, category), Value::Null);
        for key in existing.task_keys() {
            updates.insert(StorePath::day_flag(user, date, &key), Value::Null);
        }
        self.store.update(updates).await?;
        tracing::debug!(
            user = %user,
            %date,
            category = %category,
            tasks = existing.task_count(),
            "category deleted"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::UnknownCategory` if the category is not on that day,
    /// or `TrackerServiceError::Model` for an empty name.
    pub async fn add_category_task(
        &self,
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
        name: &str,
    ) -> Result<TaskId, TrackerServiceError> {
        self.load_category(user, date, category).await?;
        let task = CustomTask::new(name, self.clock.now())?;
        let id = TaskId::generate();
        let path = StorePath::day_category_task(user, date, category, &id);
        self.store.set(&path, task.to_value()).await?;
        Ok(id)
    }

    /// Removes a task definition and its completion flag together.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Storage` if the write fails.
    pub async fn delete_category_task(
        &self,
        user: &UserId,
        date: CalendarDate,
        category: &CategoryId,
        task: &TaskId,
    ) -> Result<(), TrackerServiceError> {
        let updates = PathUpdate::from([
            (StorePath::day_category_task(user, date, category, task), Value::Null),
            (
                StorePath::day_flag(user, date, &TaskKey::custom(category, task)),
                Value::Null,
            ),
        ]);
        self.store.update(updates).await?;
        Ok(())
    }

    /// Adds a task definition to one of the built-in categories. It is shown on every day.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` for an empty name, or storage errors.
    pub async fn add_fixed_task(
        &self,
        user: &UserId,
        category: FixedCategory,
        name: &str,
    ) -> Result<TaskId, TrackerServiceError> {
        let task = CustomTask::new(name, self.clock.now())?;
        let id = TaskId::generate();
        let path = StorePath::fixed_task(user, category, &id);
        self.store
            .set(&path, FixedTaskCatalog::task_value(category, &task))
            .await?;
        tracing::debug!(user = %user, %category, task = %id, "fixed task added");
        Ok(id)
    }

    /// The user's built-in category tasks. A failed read yields an empty catalog.
    pub async fn fixed_tasks(&self, user: &UserId) -> FixedTaskCatalog {
        let snapshot = read_or_empty(self.store.as_ref(), &StorePath::fixed_tasks(user)).await;
        FixedTaskCatalog::from_snapshot(snapshot.as_ref())
    }

    /// Removes a built-in category task and its flag on `date`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Storage` if the write fails.
    pub async fn delete_fixed_task(
        &self,
        user: &UserId,
        category: FixedCategory,
        task: &TaskId,
        date: CalendarDate,
    ) -> Result<(), TrackerServiceError> {
        let updates = PathUpdate::from([
            (StorePath::fixed_task(user, category, task), Value::Null),
            (
                StorePath::day_flag(user, date, &category.task_key(task)),
                Value::Null,
            ),
        ]);
        self.store.update(updates).await?;
        Ok(())
    }

    pub async fn day_view(&self, user: &UserId, date: CalendarDate) -> DayView {
        let record = self.load_day(user, date).await;
        let fixed_tasks = self.fixed_tasks(user).await;
        DayView {
            date,
            progress: compute_day_progress(&record),
            record,
            fixed_tasks,
        }
    }

    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` if `month_index` is not `0..=11`.
    pub async fn month_progress(
        &self,
        user: &UserId,
        year: i32,
        month_index: u32,
    ) -> Result<MonthProgress, TrackerServiceError> {
        let month = checked_month(year, month_index)?;
        Ok(compute_month_progress(&self.load_month(user, month).await))
    }

    /// Month grid with "today" taken from the service clock.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` if `month_index` is not `0..=11`.
    pub async fn calendar(
        &self,
        user: &UserId,
        year: i32,
        month_index: u32,
    ) -> Result<MonthView, TrackerServiceError> {
        let month = checked_month(year, month_index)?;
        let record = self.load_month(user, month).await;
        Ok(MonthView::build(month, &record, self.clock.today()))
    }

    /// Calls `on_change` with a freshly computed view now and after every
    /// change to the month. Each snapshot replaces the previous state.
    ///
    /// # Errors
    ///
    /// Returns `TrackerServiceError::Model` for a bad month index, or storage errors.
    pub async fn watch_month<F>(
        &self,
        user: &UserId,
        year: i32,
        month_index: u32,
        on_change: F,
    ) -> Result<Subscription, TrackerServiceError>
    where
        F: Fn(MonthView) + Send + Sync + 'static,
    {
        let month = checked_month(year, month_index)?;
        let clock = self.clock;
        let path = StorePath::month(user, year, month_index);
        let subscription = self
            .store
            .subscribe(
                &path,
                Arc::new(move |snapshot: Option<Value>| {
                    let record = MonthRecord::from_snapshot(snapshot.as_ref());
                    on_change(MonthView::build(month, &record, clock.today()));
                }),
            )
            .await?;
        Ok(subscription)
    }
}

fn checked_month(year: i32, month_index: u32) -> Result<MonthKey, TrackerServiceError> {
    Ok(CalendarDate::new(year, month_index, 1)?.month_key())
}
