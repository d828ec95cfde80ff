use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::model::day::CustomTask;
use crate::model::ids::TaskId;
use crate::model::task_key::TaskKey;

/// The four built-in groups whose task definitions are kept per user,
/// not per day (`users/{uid}/customTasks/{category}/{taskId}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixedCategory {
    Daily,
    Learning,
    Mindfulness,
    Extra,
}

impl FixedCategory {
    pub const ALL: [FixedCategory; 4] = [
        FixedCategory::Daily,
        FixedCategory::Learning,
        FixedCategory::Mindfulness,
        FixedCategory::Extra,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FixedCategory::Daily => "daily",
            FixedCategory::Learning => "learning",
            FixedCategory::Mindfulness => "mindfulness",
            FixedCategory::Extra => "extra",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            FixedCategory::Daily => "Daily Activities",
            FixedCategory::Learning => "Learning & Reading",
            FixedCategory::Mindfulness => "Mindfulness & Reflection",
            FixedCategory::Extra => "Additional Activities",
        }
    }

    /// Flag key used in a day record for one of this category's tasks.
    #[must_use]
    pub fn task_key(&self, task: &TaskId) -> TaskKey {
        TaskKey::custom(self.as_str(), task)
    }
}

impl FromStr for FixedCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ModelError::UnknownFixedCategory(s.to_owned()))
    }
}

impl fmt::Display for FixedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's task definitions for the fixed categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedTaskCatalog {
    tasks: BTreeMap<FixedCategory, BTreeMap<TaskId, CustomTask>>,
}

impl FixedTaskCatalog {
    /// Decodes the `customTasks` subtree; unknown category names are skipped.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut catalog = Self::default();
        let Some(groups) = value.as_object() else {
            return catalog;
        };
        for (name, tasks) in groups {
            let Ok(category) = name.parse::<FixedCategory>() else {
                continue;
            };
            let Some(tasks) = tasks.as_object() else {
                continue;
            };
            let entry = catalog.tasks.entry(category).or_default();
            for (id, task) in tasks {
                entry.insert(TaskId::from_stored(id), CustomTask::from_value(task));
            }
        }
        catalog
    }

    #[must_use]
    pub fn from_snapshot(value: Option<&Value>) -> Self {
        value.map_or_else(Self::default, Self::from_value)
    }

    pub fn tasks(&self, category: FixedCategory) -> impl Iterator<Item = (&TaskId, &CustomTask)> {
        self.tasks.get(&category).into_iter().flat_map(|tasks| tasks.iter())
    }

    #[must_use]
    pub fn task(&self, category: FixedCategory, id: &TaskId) -> Option<&CustomTask> {
        self.tasks.get(&category).and_then(|tasks| tasks.get(id))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.values().all(BTreeMap::is_empty)
    }

    pub fn insert(&mut self, category: FixedCategory, id: TaskId, task: CustomTask) {
        self.tasks.entry(category).or_default().insert(id, task);
    }

    /// Value stored for a single definition, tagged with its category.
    #[must_use]
    pub fn task_value(category: FixedCategory, task: &CustomTask) -> Value {
        let mut value = task.to_value();
        if let Value::Object(map) = &mut value {
            map.insert("category".into(), Value::String(category.as_str().into()));
        }
        value
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let groups: Map<String, Value> = self
            .tasks
            .iter()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(category, tasks)| {
                let tasks = tasks
                    .iter()
                    .map(|(id, task)| (id.to_string(), Self::task_value(*category, task)))
                    .collect();
                (category.as_str().to_owned(), Value::Object(tasks))
            })
            .collect();
        Value::Object(groups)
    }
}
