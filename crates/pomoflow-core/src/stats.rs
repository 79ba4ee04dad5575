//! Usage statistics.
//!
//! The same shape is returned by the REST service and computed locally from
//! cached data when signed out.

use serde::{Deserialize, Serialize};

use crate::distraction::DistractionReport;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub task_id: i64,
    pub task_title: String,
    /// Seconds.
    pub total_time_spent: u64,
    pub pomodoros_completed: u64,
    /// Completed subtasks over total, 0..=100, two decimals.
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total_time_spent: u64,
    pub pomodoros_completed: u64,
    pub tasks_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_pomodoros: u64,
    pub total_time_spent: u64,
    #[serde(default)]
    pub tasks_stats: Vec<TaskStats>,
    #[serde(default)]
    pub category_stats: Vec<CategoryStats>,
    #[serde(default)]
    pub distractions_count: u64,
    #[serde(default)]
    pub phone_usage_count: u64,
}

impl Statistics {
    /// Summarize local data. Pomodoros are not tracked per task locally, so
    /// the per-task and per-category pomodoro counts are zero.
    pub fn from_local(tasks: &[Task], pomodoro_count: u64, reports: &[DistractionReport]) -> Self {
        let tasks_stats = tasks
            .iter()
            .map(|task| TaskStats {
                task_id: task.id,
                task_title: task.title.clone(),
                total_time_spent: task.time_spent_secs,
                pomodoros_completed: 0,
                completion_percentage: completion_percentage(task),
            })
            .collect();

        let mut category_stats: Vec<CategoryStats> = Vec::new();
        for task in tasks {
            let label = task.category_label();
            let idx = match category_stats.iter().position(|c| c.category == label) {
                Some(idx) => idx,
                None => {
                    category_stats.push(CategoryStats {
                        category: label,
                        total_time_spent: 0,
                        pomodoros_completed: 0,
                        tasks_count: 0,
                    });
                    category_stats.len() - 1
                }
            };
            category_stats[idx].total_time_spent += task.time_spent_secs;
            category_stats[idx].tasks_count += 1;
        }

        Self {
            total_pomodoros: pomodoro_count,
            total_time_spent: tasks.iter().map(|t| t.time_spent_secs).sum(),
            tasks_stats,
            category_stats,
            distractions_count: reports.iter().filter(|r| r.had_distractions).count() as u64,
            phone_usage_count: reports.iter().filter(|r| r.used_phone).count() as u64,
        }
    }
}

/// Zero for tasks without subtasks, regardless of the task flag.
fn completion_percentage(task: &Task) -> f64 {
    if task.subtasks.is_empty() {
        return 0.0;
    }
    (task.progress_pct() * 100.0).round() / 100.0
}
