use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::model::ids::{CategoryId, TaskId};
use crate::model::task_key::{CATEGORIES_KEY, TaskKey};

//
// ─── CUSTOM CATEGORIES ─────────────────────────────────────────────────────────
//

/// A task defined inside a custom category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTask {
    name: String,
    created: Option<DateTime<Utc>>,
}

impl CustomTask {
    /// # Errors
    ///
    /// Returns `ModelError::EmptyName` if the trimmed name is empty.
    pub fn new(name: &str, created: DateTime<Utc>) -> Result<Self, ModelError> {
        Ok(Self {
            name: clean_name(name)?,
            created: Some(created),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    /// Any stored value defines a task; non-object values yield an unnamed one.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            name: str_field(value, "name").unwrap_or_default(),
            created: timestamp_field(value, "created"),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        if let Some(created) = self.created {
            map.insert("created".into(), Value::String(format_timestamp(created)));
        }
        Value::Object(map)
    }
}

/// A day-specific category with its own task definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCategory {
    id: CategoryId,
    name: String,
    icon: Option<String>,
    created: Option<DateTime<Utc>>,
    tasks: BTreeMap<TaskId, CustomTask>,
}

impl CustomCategory {
    /// # Errors
    ///
    /// Returns `ModelError::EmptyName` if the trimmed name is empty.
    pub fn new(
        id: CategoryId,
        name: &str,
        icon: Option<&str>,
        created: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            id,
            name: clean_name(name)?,
            icon: icon.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned),
            created: Some(created),
            tasks: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&TaskId, &CustomTask)> {
        self.tasks.iter()
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&CustomTask> {
        self.tasks.get(id)
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn insert_task(&mut self, id: TaskId, task: CustomTask) {
        self.tasks.insert(id, task);
    }

    pub fn remove_task(&mut self, id: &TaskId) -> Option<CustomTask> {
        self.tasks.remove(id)
    }

    /// Flag keys of every task in this category.
    pub fn task_keys(&self) -> impl Iterator<Item = TaskKey> + '_ {
        self.tasks.keys().map(|task| TaskKey::custom(&self.id, task))
    }

    /// Decodes a stored category; a non-object value yields an empty category.
    #[must_use]
    pub fn from_value(id: CategoryId, value: &Value) -> Self {
        let tasks = value
            .get("tasks")
            .and_then(Value::as_object)
            .map(|tasks| {
                tasks
                    .iter()
                    .map(|(task_id, task)| (TaskId::from_stored(task_id), CustomTask::from_value(task)))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id,
            name: str_field(value, "name").unwrap_or_default(),
            icon: str_field(value, "icon"),
            created: timestamp_field(value, "created"),
            tasks,
        }
    }

    fn definition_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        if let Some(icon) = &self.icon {
            map.insert("icon".into(), Value::String(icon.clone()));
        }
        if let Some(created) = self.created {
            map.insert("created".into(), Value::String(format_timestamp(created)));
        }
        map.insert("daySpecific".into(), Value::Bool(true));
        map
    }

    /// The category definition as stored, without its tasks.
    #[must_use]
    pub fn definition_value(&self) -> Value {
        Value::Object(self.definition_map())
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.definition_map();
        if !self.tasks.is_empty() {
            let tasks = self
                .tasks
                .iter()
                .map(|(id, task)| (id.to_string(), task.to_value()))
                .collect();
            map.insert("tasks".into(), Value::Object(tasks));
        }
        Value::Object(map)
    }
}

//
// ─── DAY RECORD ────────────────────────────────────────────────────────────────
//

/// One day's raw completion flags plus its custom category definitions.
///
/// Flag values are kept exactly as stored; only a strict `true` counts as done.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayRecord {
    flags: BTreeMap<TaskKey, Value>,
    categories: BTreeMap<CategoryId, CustomCategory>,
}

impl DayRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a stored day. Anything that is not an object is an empty day.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return Self::default();
        };

        let mut record = Self::default();
        for (key, field) in fields {
            if key == CATEGORIES_KEY {
                if let Some(categories) = field.as_object() {
                    for (id, category) in categories {
                        let id = CategoryId::from_stored(id);
                        record
                            .categories
                            .insert(id.clone(), CustomCategory::from_value(id, category));
                    }
                }
            } else {
                record.flags.insert(TaskKey::from_stored(key), field.clone());
            }
        }
        record
    }

    /// Convenience for snapshots that may be missing.
    #[must_use]
    pub fn from_snapshot(value: Option<&Value>) -> Self {
        value.map_or_else(Self::default, Self::from_value)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map: Map<String, Value> = self
            .flags
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        if !self.categories.is_empty() {
            let categories = self
                .categories
                .iter()
                .map(|(id, category)| (id.to_string(), category.to_value()))
                .collect();
            map.insert(CATEGORIES_KEY.into(), Value::Object(categories));
        }
        Value::Object(map)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.categories.is_empty()
    }

    /// Raw flag entries, including ones whose value is not a boolean.
    pub fn flags(&self) -> impl Iterator<Item = (&TaskKey, &Value)> {
        self.flags.iter()
    }

    #[must_use]
    pub fn flag(&self, key: &TaskKey) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Strict check: only a stored boolean `true` is completed.
    #[must_use]
    pub fn is_completed(&self, key: &TaskKey) -> bool {
        matches!(self.flags.get(key), Some(Value::Bool(true)))
    }

    pub fn set_flag(&mut self, key: TaskKey, completed: bool) {
        self.flags.insert(key, Value::Bool(completed));
    }

    /// Flips a flag and returns the new state. Missing or non-`true` flips to `true`.
    pub fn toggle(&mut self, key: &TaskKey) -> bool {
        let next = !self.is_completed(key);
        self.flags.insert(key.clone(), Value::Bool(next));
        next
    }

    pub fn remove_flag(&mut self, key: &TaskKey) -> Option<Value> {
        self.flags.remove(key)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CustomCategory> {
        self.categories.values()
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&CustomCategory> {
        self.categories.get(id)
    }

    pub fn category_mut(&mut self, id: &CategoryId) -> Option<&mut CustomCategory> {
        self.categories.get_mut(id)
    }

    pub fn insert_category(&mut self, category: CustomCategory) {
        self.categories.insert(category.id().clone(), category);
    }

    /// Removes a category together with the completion flags of its tasks.
    pub fn remove_category(&mut self, id: &CategoryId) -> Option<CustomCategory> {
        let removed = self.categories.remove(id)?;
        for key in removed.task_keys() {
            self.flags.remove(&key);
        }
        Some(removed)
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

pub(crate) fn clean_name(raw: &str) -> Result<String, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn str_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_owned)
}

pub(crate) fn timestamp_field(value: &Value, field: &str) -> Option<DateTime<Utc>> {
    value
        .get(field)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use serde_json::json;

    #[test]
    fn decodes_flags_and_categories() {
        let record = DayRecord::from_value(&json!({
            "morning": true,
            "evening": "false",
            "customCategories": {
                "c1": {
                    "name": "Fitness",
                    "icon": "fa-dumbbell",
                    "created": "2024-03-01T08:00:00.000Z",
                    "tasks": { "t1": { "name": "Run" }, "t2": 7 }
                }
            }
        }));

        assert!(record.is_completed(&TaskKey::new("morning").unwrap()));
        assert!(!record.is_completed(&TaskKey::new("evening").unwrap()));
        assert_eq!(record.flags().count(), 2);

        let category = record.category(&CategoryId::new("c1").unwrap()).unwrap();
        assert_eq!(category.name(), "Fitness");
        assert_eq!(category.icon(), Some("fa-dumbbell"));
        assert!(category.created().is_some());
        assert_eq!(category.task_count(), 2);
        assert_eq!(category.task(&TaskId::new("t2").unwrap()).unwrap().name(), "");
    }

    #[test]
    fn non_objects_decode_to_empty_days() {
        assert!(DayRecord::from_value(&json!(null)).is_empty());
        assert!(DayRecord::from_value(&json!([1, 2])).is_empty());
        assert!(DayRecord::from_snapshot(None).is_empty());
    }

    #[test]
    fn toggle_flips_strictly() {
        let mut record = DayRecord::from_value(&json!({ "noon": 1 }));
        let key = TaskKey::new("noon").unwrap();
        assert!(record.toggle(&key));
        assert!(!record.toggle(&key));
    }

    #[test]
    fn removing_a_category_drops_its_flags() {
        let mut record = DayRecord::new();
        let id = CategoryId::new("c1").unwrap();
        let mut category = CustomCategory::new(id.clone(), " Reading ", None, fixed_now()).unwrap();
        let task = TaskId::new("t1").unwrap();
        category.insert_task(task.clone(), CustomTask::new("Chapter", fixed_now()).unwrap());
        record.insert_category(category);
        record.set_flag(TaskKey::custom(&id, &task), true);
        record.set_flag(TaskKey::new("morning").unwrap(), true);

        let removed = record.remove_category(&id).unwrap();
        assert_eq!(removed.name(), "Reading");
        assert_eq!(record.flags().count(), 1);
    }

    #[test]
    fn encodes_back_to_store_shape() {
        let id = CategoryId::new("c1").unwrap();
        let mut category = CustomCategory::new(id.clone(), "Reading", Some("fa-book"), fixed_now()).unwrap();
        category.insert_task(TaskId::new("t1").unwrap(), CustomTask::new("Chapter", fixed_now()).unwrap());
        let mut record = DayRecord::new();
        record.insert_category(category);

        let value = record.to_value();
        assert_eq!(value["customCategories"]["c1"]["name"], "Reading");
        assert_eq!(value["customCategories"]["c1"]["daySpecific"], true);
        assert_eq!(value["customCategories"]["c1"]["tasks"]["t1"]["name"], "Chapter");
        assert_eq!(DayRecord::from_value(&value), record);
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            CustomCategory::new(CategoryId::generate(), "   ", None, fixed_now()),
            Err(ModelError::EmptyName)
        );
        assert_eq!(CustomTask::new("", fixed_now()), Err(ModelError::EmptyName));
    }
}
