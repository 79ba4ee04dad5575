use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Every state change in the system produces an Event.
/// The CLI prints them; the remote sync consumes completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Mode changed; any running countdown was discarded.
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ObjectiveChanged {
        objective: String,
        at: DateTime<Utc>,
    },
    FocusChanged {
        task_id: Option<i64>,
        subtask_ids: Vec<i64>,
        at: DateTime<Utc>,
    },
    /// A work interval ran down to zero.
    WorkCompleted {
        objective: String,
        task_id: Option<i64>,
        subtask_ids: Vec<i64>,
        credited_secs: u64,
        at: DateTime<Utc>,
    },
    /// A short or long break ran down to zero. Breaks are not counted.
    BreakCompleted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Completion counter advanced.
    PomodoroCounted {
        count: u64,
        at: DateTime<Utc>,
    },
    /// Focus time was added to a task.
    TimeCredited {
        task_id: i64,
        subtask_ids: Vec<i64>,
        credited_secs: u64,
        task_total_secs: u64,
        at: DateTime<Utc>,
    },
    /// The user should be asked about distractions during the last pomodoro.
    DistractionPromptDue {
        pomodoro_number: u64,
        forced: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        running: bool,
        remaining_secs: u64,
        total_secs: u64,
        objective: String,
        task_id: Option<i64>,
        subtask_ids: Vec<i64>,
        at: DateTime<Utc>,
    },
}
