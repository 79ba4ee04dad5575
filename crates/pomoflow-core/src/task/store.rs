use std::collections::BTreeSet;

use chrono::Utc;

use super::{Subtask, Task, TaskCategory};
use crate::error::ValidationError;

/// In-memory task list.
///
/// Every mutation builds a new collection in which exactly the targeted
/// task differs and then swaps it in; nothing is visible until the swap.
/// A failed mutation leaves the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    /// Task whose context menu is open, if any.
    menu_target: Option<i64>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            menu_target: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks whose title contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn menu_target(&self) -> Option<i64> {
        self.menu_target
    }

    /// Open the context menu on `id`, or close it if it is already open there.
    pub fn toggle_menu(&mut self, id: i64) {
        self.menu_target = if self.menu_target == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn close_menu(&mut self) {
        self.menu_target = None;
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a task with default fields and return its id.
    pub fn add_task(&mut self, title: impl Into<String>) -> i64 {
        let id = self.next_id();
        let mut next = self.tasks.clone();
        next.push(Task::new(id, title));
        self.tasks = next;
        id
    }

    pub fn rename_task(&mut self, id: i64, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        self.replace_task(id, |task| {
            Ok(Task {
                title,
                ..task.clone()
            })
        })
    }

    /// Flip the task's own flag. Returns the new value.
    pub fn toggle_task(&mut self, id: i64) -> Result<bool, ValidationError> {
        let mut completed = false;
        self.replace_task(id, |task| {
            completed = !task.completed;
            Ok(Task {
                completed,
                ..task.clone()
            })
        })?;
        Ok(completed)
    }

    /// Flip a subtask, then set the parent's flag to whether all of its
    /// subtasks are complete. Returns the parent's new flag.
    pub fn toggle_subtask(&mut self, task_id: i64, subtask_id: i64) -> Result<bool, ValidationError> {
        let mut parent_completed = false;
        self.replace_task(task_id, |task| {
            if task.subtask(subtask_id).is_none() {
                return Err(ValidationError::SubtaskNotFound {
                    task_id,
                    subtask_id,
                });
            }
            let subtasks: Vec<Subtask> = task
                .subtasks
                .iter()
                .map(|s| {
                    if s.id == subtask_id {
                        Subtask {
                            completed: !s.completed,
                            ..s.clone()
                        }
                    } else {
                        s.clone()
                    }
                })
                .collect();
            parent_completed = subtasks.iter().all(|s| s.completed);
            Ok(Task {
                subtasks,
                completed: parent_completed,
                ..task.clone()
            })
        })?;
        Ok(parent_completed)
    }

    /// Any category other than `Other` clears the custom label.
    pub fn set_category(&mut self, id: i64, category: TaskCategory) -> Result<(), ValidationError> {
        self.replace_task(id, |task| {
            let custom_category = if category == TaskCategory::Other {
                task.custom_category.clone()
            } else {
                String::new()
            };
            Ok(Task {
                category,
                custom_category,
                ..task.clone()
            })
        })
    }

    pub fn set_custom_category(
        &mut self,
        id: i64,
        label: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let custom_category = label.into();
        self.replace_task(id, |task| {
            Ok(Task {
                custom_category,
                ..task.clone()
            })
        })
    }

    /// Append a subtask to `task_id` and return the new subtask id.
    pub fn add_subtask(&mut self, task_id: i64, title: impl Into<String>) -> Result<i64, ValidationError> {
        let id = self.next_id();
        let title = title.into();
        self.replace_task(task_id, |task| {
            let mut subtasks = task.subtasks.clone();
            subtasks.push(Subtask::new(id, title));
            Ok(Task {
                subtasks,
                ..task.clone()
            })
        })?;
        Ok(id)
    }

    /// Remove a task together with its subtasks.
    pub fn delete_task(&mut self, id: i64) -> Result<Task, ValidationError> {
        let removed = self
            .get(id)
            .cloned()
            .ok_or(ValidationError::TaskNotFound(id))?;
        self.tasks = self.tasks.iter().filter(|t| t.id != id).cloned().collect();
        if self.menu_target == Some(id) {
            self.menu_target = None;
        }
        Ok(removed)
    }

    /// Archiving currently removes the task, same as delete.
    pub fn archive_task(&mut self, id: i64) -> Result<Task, ValidationError> {
        self.delete_task(id)
    }

    /// Add `secs` of focus time to the selected subtasks of `task_id` and
    /// recompute the task total as the sum over all its subtasks. A task
    /// without subtasks is credited directly.
    ///
    /// Returns the task's new total, or `None` if the task no longer exists.
    pub fn credit_focus(&mut self, task_id: i64, subtask_ids: &BTreeSet<i64>, secs: u64) -> Option<u64> {
        let mut total = 0;
        self.replace_task(task_id, |task| {
            if task.subtasks.is_empty() {
                total = task.time_spent_secs.saturating_add(secs);
                return Ok(Task {
                    time_spent_secs: total,
                    ..task.clone()
                });
            }
            let subtasks: Vec<Subtask> = task
                .subtasks
                .iter()
                .map(|s| {
                    if subtask_ids.contains(&s.id) {
                        Subtask {
                            time_spent_secs: s.time_spent_secs.saturating_add(secs),
                            ..s.clone()
                        }
                    } else {
                        s.clone()
                    }
                })
                .collect();
            total = subtasks.iter().map(|s| s.time_spent_secs).sum();
            Ok(Task {
                subtasks,
                time_spent_secs: total,
                ..task.clone()
            })
        })
        .ok()?;
        Some(total)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn replace_task<F>(&mut self, id: i64, update: F) -> Result<(), ValidationError>
    where
        F: FnOnce(&Task) -> Result<Task, ValidationError>,
    {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ValidationError::TaskNotFound(id))?;
        let updated = update(&self.tasks[idx])?;
        let mut next = self.tasks.clone();
        next[idx] = updated;
        self.tasks = next;
        Ok(())
    }

    /// Millisecond timestamp, bumped past every id already in use.
    fn next_id(&self) -> i64 {
        let max_used = self
            .tasks
            .iter()
            .flat_map(|t| std::iter::once(t.id).chain(t.subtasks.iter().map(|s| s.id)))
            .max()
            .unwrap_or(0);
        Utc::now().timestamp_millis().max(max_used + 1)
    }
}
