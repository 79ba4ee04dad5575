use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::mode::TimerMode;

/// Persisted descriptor of the active pomodoro.
///
/// One per user session. Written to local storage after every change so a
/// restart picks up the same objective, focus and remaining time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub subtask_ids: BTreeSet<i64>,
    /// Seconds left on the countdown.
    #[serde(alias = "timer")]
    pub remaining_secs: u64,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub mode: TimerMode,
}
