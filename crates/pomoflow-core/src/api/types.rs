//! Wire records for the REST service.
//!
//! Field names are snake_case as the service sends them. Timestamps are
//! kept as the strings the server produced, since it may omit the offset.

use serde::{Deserialize, Serialize};

use crate::task::TaskCategory;
use crate::timer::TimerMode;

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub custom_category: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub category: TaskCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_category: Option<String>,
    pub time_spent: u64,
    /// Filled in by the client.
    pub user_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            category: TaskCategory::default(),
            custom_category: None,
            time_spent: 0,
            user_id: None,
        }
    }
}

/// Partial update; unset fields are left unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TaskCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: Option<String>,
}

// ── Subtasks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubtask {
    pub task_id: i64,
    pub title: String,
    pub completed: bool,
    pub time_spent: u64,
}

impl NewSubtask {
    pub fn new(task_id: i64, title: impl Into<String>) -> Self {
        Self {
            task_id,
            title: title.into(),
            completed: false,
            time_spent: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

// ── Pomodoros ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroRecord {
    pub id: i64,
    #[serde(default)]
    pub mode: TimerMode,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub subtask_ids: Option<Vec<i64>>,
    /// Seconds.
    pub duration: u64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPomodoro {
    pub mode: TimerMode,
    pub objective: Option<String>,
    pub task_id: Option<i64>,
    pub subtask_ids: Vec<i64>,
    pub duration: u64,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PomodoroPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TimerMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroCompletion {
    pub pomodoro_id: i64,
    pub actual_duration: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroCount {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomodoroQuery {
    pub task_id: Option<i64>,
    pub completed: Option<bool>,
}

// ── Distractions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionRecord {
    pub id: i64,
    pub pomodoro_id: i64,
    pub had_distractions: bool,
    pub used_phone: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDistraction {
    pub pomodoro_id: i64,
    pub had_distractions: bool,
    pub used_phone: bool,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub had_distractions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_phone: Option<bool>,
}
