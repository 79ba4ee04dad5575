//! Tasks, subtasks and the in-memory task store.
//!
//! A task's accumulated time is the sum of its subtasks' time once it has
//! subtasks; its completion flag follows its subtasks whenever one of them
//! is toggled.

mod store;

pub use store::TaskStore;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_TASK_TITLE: &str = "New task";
pub const DEFAULT_SUBTASK_TITLE: &str = "New subtask";

/// Category of a task.
///
/// `Other` carries a user-defined label in [`Task::custom_category`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    #[default]
    Personal,
    Laboral,
    #[serde(rename = "otro", alias = "other")]
    Other,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Personal => "personal",
            TaskCategory::Laboral => "laboral",
            TaskCategory::Other => "otro",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "personal" => Ok(TaskCategory::Personal),
            "laboral" | "work" => Ok(TaskCategory::Laboral),
            "otro" | "other" => Ok(TaskCategory::Other),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Accumulated focus time in seconds.
    #[serde(default, alias = "timeSpent")]
    pub time_spent_secs: u64,
}

impl Subtask {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            time_spent_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: TaskCategory,
    /// Free-form label, only meaningful when `category` is `Other`.
    #[serde(default)]
    pub custom_category: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Accumulated focus time in seconds.
    #[serde(default, alias = "timeSpent")]
    pub time_spent_secs: u64,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            category: TaskCategory::default(),
            custom_category: String::new(),
            subtasks: Vec::new(),
            time_spent_secs: 0,
        }
    }

    pub fn subtask(&self, id: i64) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_ids(&self) -> Vec<i64> {
        self.subtasks.iter().map(|s| s.id).collect()
    }

    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }

    /// 0.0 .. 100.0; falls back to the task flag when there are no subtasks.
    pub fn progress_pct(&self) -> f64 {
        if self.subtasks.is_empty() {
            return if self.completed { 100.0 } else { 0.0 };
        }
        self.completed_subtasks() as f64 / self.subtasks.len() as f64 * 100.0
    }

    /// Label used when grouping by category.
    pub fn category_label(&self) -> String {
        match self.category {
            TaskCategory::Other if !self.custom_category.is_empty() => {
                self.custom_category.clone()
            }
            category => category.as_str().to_string(),
        }
    }

    pub fn subtask_time_sum(&self) -> u64 {
        self.subtasks.iter().map(|s| s.time_spent_secs).sum()
    }
}
