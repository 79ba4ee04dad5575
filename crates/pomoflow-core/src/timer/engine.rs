//! Pomodoro session controller.
//!
//! A discrete countdown state machine. It does not own a clock: the caller
//! invokes `tick()` once per second while the timer is running (see
//! [`super::Ticker`]).
//!
//! ## State Transitions
//!
//! ```text
//! (mode, Paused) --start--> (mode, Running) --pause--> (mode, Paused)
//! (mode, Running) --tick to 0--> (mode, Paused), remaining reset
//! (any) --switch_mode(m)--> (m, Paused), remaining = duration(m)
//! ```
//!
//! The mode never advances on its own; a finished work interval stays in
//! work mode until the user switches.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = PomodoroTimer::new(ModeDurations::default());
//! timer.start();
//! // Once per second:
//! let events = timer.tick(&mut workspace);
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::mode::{ModeDurations, TimerMode};
use super::session::ActiveSession;
use crate::error::ValidationError;
use crate::events::Event;
use crate::task::Task;

/// Payload handed to the [`CompletionHandler`] when a work interval finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCompletion {
    pub objective: String,
    pub task_id: Option<i64>,
    pub subtask_ids: BTreeSet<i64>,
    /// Nominal work duration, independent of pauses or wall-clock drift.
    pub credited_secs: u64,
    pub at: DateTime<Utc>,
}

impl WorkCompletion {
    pub fn to_event(&self) -> Event {
        Event::WorkCompleted {
            objective: self.objective.clone(),
            task_id: self.task_id,
            subtask_ids: self.subtask_ids.iter().copied().collect(),
            credited_secs: self.credited_secs,
            at: self.at,
        }
    }
}

/// Receives work-interval completions synchronously from [`PomodoroTimer::tick`].
///
/// Returns any follow-up events it produced.
pub trait CompletionHandler {
    fn on_work_completed(&mut self, completion: &WorkCompletion) -> Vec<Event>;
}

impl<F> CompletionHandler for F
where
    F: FnMut(&WorkCompletion) -> Vec<Event>,
{
    fn on_work_completed(&mut self, completion: &WorkCompletion) -> Vec<Event> {
        self(completion)
    }
}

/// Core countdown state machine with objective and task focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroTimer {
    durations: ModeDurations,
    mode: TimerMode,
    running: bool,
    remaining_secs: u64,
    objective: String,
    task_id: Option<i64>,
    subtask_ids: BTreeSet<i64>,
}

impl PomodoroTimer {
    /// Starts paused in work mode with a full work interval.
    pub fn new(durations: ModeDurations) -> Self {
        Self {
            durations,
            mode: TimerMode::Work,
            running: false,
            remaining_secs: durations.work_secs,
            objective: String::new(),
            task_id: None,
            subtask_ids: BTreeSet::new(),
        }
    }

    /// Rebuild from a persisted session.
    ///
    /// The session always comes back paused. Remaining time is clamped to the
    /// configured duration of its mode; an exhausted countdown is refilled.
    pub fn restore(durations: ModeDurations, session: &ActiveSession) -> Self {
        let full = durations.for_mode(session.mode);
        let remaining_secs = match session.remaining_secs {
            0 => full,
            secs => secs.min(full),
        };
        Self {
            durations,
            mode: session.mode,
            running: false,
            remaining_secs,
            objective: session.objective.clone(),
            task_id: session.task_id,
            subtask_ids: if session.task_id.is_some() {
                session.subtask_ids.clone()
            } else {
                BTreeSet::new()
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.durations.for_mode(self.mode)
    }

    pub fn durations(&self) -> ModeDurations {
        self.durations
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn task_id(&self) -> Option<i64> {
        self.task_id
    }

    pub fn subtask_ids(&self) -> &BTreeSet<i64> {
        &self.subtask_ids
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / total as f64)
    }

    /// Persistable descriptor of the current state.
    pub fn snapshot(&self) -> ActiveSession {
        ActiveSession {
            objective: self.objective.clone(),
            task_id: self.task_id,
            subtask_ids: self.subtask_ids.clone(),
            remaining_secs: self.remaining_secs,
            is_running: self.running,
            mode: self.mode,
        }
    }

    /// Build a full state snapshot event.
    pub fn state_event(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            running: self.running,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            objective: self.objective.clone(),
            task_id: self.task_id,
            subtask_ids: self.subtask_ids.iter().copied().collect(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        debug!(mode = ?self.mode, remaining_secs = self.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        debug!(mode = ?self.mode, remaining_secs = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop, change mode and refill the countdown. Progress is discarded.
    pub fn switch_mode(&mut self, mode: TimerMode) -> Event {
        let from = self.mode;
        self.running = false;
        self.mode = mode;
        self.remaining_secs = self.durations.for_mode(mode);
        debug!(?from, to = ?mode, "timer mode switched");
        Event::ModeSwitched {
            from,
            to: mode,
            duration_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn set_objective(&mut self, objective: impl Into<String>) -> Event {
        self.objective = objective.into();
        Event::ObjectiveChanged {
            objective: self.objective.clone(),
            at: Utc::now(),
        }
    }

    /// Associate the session with `task` and a subset of its subtasks.
    ///
    /// # Errors
    /// Returns `SubtaskNotFound` if any id is not a subtask of `task`.
    pub fn select_focus(
        &mut self,
        task: &Task,
        subtask_ids: impl IntoIterator<Item = i64>,
    ) -> Result<Event, ValidationError> {
        let selected: BTreeSet<i64> = subtask_ids.into_iter().collect();
        if let Some(&missing) = selected.iter().find(|id| task.subtask(**id).is_none()) {
            return Err(ValidationError::SubtaskNotFound {
                task_id: task.id,
                subtask_id: missing,
            });
        }
        self.task_id = Some(task.id);
        self.subtask_ids = selected;
        Ok(self.focus_event())
    }

    pub fn clear_focus(&mut self) -> Event {
        self.task_id = None;
        self.subtask_ids.clear();
        self.focus_event()
    }

    /// Call once per second. Counts down while running; at zero the timer
    /// pauses, refills for the current mode and, for work intervals only,
    /// hands the completion to `handler` exactly once.
    pub fn tick(&mut self, handler: &mut dyn CompletionHandler) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        self.running = false;
        self.remaining_secs = self.durations.for_mode(self.mode);
        let at = Utc::now();

        if !self.mode.is_work() {
            debug!(mode = ?self.mode, "break completed");
            return vec![Event::BreakCompleted { mode: self.mode, at }];
        }

        let completion = WorkCompletion {
            objective: self.objective.clone(),
            task_id: self.task_id,
            subtask_ids: self.subtask_ids.clone(),
            credited_secs: self.durations.work_secs,
            at,
        };
        debug!(task_id = ?completion.task_id, "work interval completed");
        let mut events = vec![completion.to_event()];
        events.extend(handler.on_work_completed(&completion));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn focus_event(&self) -> Event {
        Event::FocusChanged {
            task_id: self.task_id,
            subtask_ids: self.subtask_ids.iter().copied().collect(),
            at: Utc::now(),
        }
    }
}
