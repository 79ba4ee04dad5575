//! Pushes local activity to the REST service for signed-in users.
//!
//! Failures are logged and handed back to the caller. Nothing is queued or
//! retried.

use tracing::{debug, warn};

use crate::api::{
    ApiClient, ApiError, NewDistraction, NewPomodoro, PomodoroRecord, SubtaskRecord, TaskQuery,
    TaskRecord,
};
use crate::distraction::DistractionReport;
use crate::storage::{KvStore, LocalCache};
use crate::task::{Subtask, Task};
use crate::timer::{TimerMode, WorkCompletion};

pub struct RemoteSync {
    client: ApiClient,
}

impl RemoteSync {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Create a pomodoro for `completion` and immediately mark it complete
    /// with the credited duration.
    pub async fn record_completion(
        &self,
        completion: &WorkCompletion,
        mode: TimerMode,
    ) -> Result<PomodoroRecord, ApiError> {
        let new = NewPomodoro {
            mode,
            objective: Some(completion.objective.clone()).filter(|o| !o.is_empty()),
            task_id: completion.task_id,
            subtask_ids: completion.subtask_ids.iter().copied().collect(),
            duration: completion.credited_secs,
            user_id: None,
        };
        let created = self
            .client
            .pomodoros()
            .create(new)
            .await
            .inspect_err(|e| warn!("failed to create remote pomodoro: {e}"))?;
        let completed = self
            .client
            .pomodoros()
            .complete(created.id, Some(completion.credited_secs))
            .await
            .inspect_err(|e| warn!(pomodoro_id = created.id, "failed to complete remote pomodoro: {e}"))?;
        debug!(pomodoro_id = completed.id, "pomodoro recorded remotely");
        Ok(completed)
    }

    pub async fn submit_distraction(
        &self,
        pomodoro_id: i64,
        report: &DistractionReport,
    ) -> Result<(), ApiError> {
        self.client
            .distractions()
            .create(NewDistraction {
                pomodoro_id,
                had_distractions: report.had_distractions,
                used_phone: report.used_phone,
                user_id: None,
            })
            .await
            .inspect_err(|e| warn!(pomodoro_id, "failed to submit distraction report: {e}"))?;
        Ok(())
    }

    /// Record the work interval counted as `pomodoro_number` and remember
    /// its remote id in `cache`. On failure any id stored for that number is
    /// forgotten.
    pub async fn push_completion<S: KvStore>(
        &self,
        cache: &LocalCache<S>,
        pomodoro_number: u64,
        completion: &WorkCompletion,
    ) -> Result<PomodoroRecord, ApiError> {
        match self.record_completion(completion, TimerMode::Work).await {
            Ok(record) => {
                cache.save_remote_pomodoro(pomodoro_number, record.id);
                Ok(record)
            }
            Err(e) => {
                cache.forget_remote_pomodoro(pomodoro_number);
                Err(e)
            }
        }
    }

    /// Submit `report` against the remote record of the pomodoro it answers.
    /// Returns `Ok(false)` without sending anything when that pomodoro was
    /// never synced.
    pub async fn push_report<S: KvStore>(
        &self,
        cache: &LocalCache<S>,
        report: &DistractionReport,
    ) -> Result<bool, ApiError> {
        let Some(pomodoro_id) = cache.remote_pomodoro_id(report.pomodoro_number) else {
            warn!(
                pomodoro_number = report.pomodoro_number,
                "pomodoro has no remote record; report kept locally"
            );
            return Ok(false);
        };
        self.submit_distraction(pomodoro_id, report).await?;
        Ok(true)
    }

    /// The user's remote task list, converted to local tasks.
    pub async fn pull_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let records = self
            .client
            .tasks()
            .list(&TaskQuery::default())
            .await
            .inspect_err(|e| warn!("failed to pull remote tasks: {e}"))?;
        Ok(records.into_iter().map(Task::from).collect())
    }
}

impl From<SubtaskRecord> for Subtask {
    fn from(record: SubtaskRecord) -> Self {
        Subtask {
            id: record.id,
            title: record.title,
            completed: record.completed,
            time_spent_secs: record.time_spent,
        }
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Task {
            id: record.id,
            title: record.title,
            completed: record.completed,
            category: record.category,
            custom_category: record.custom_category.unwrap_or_default(),
            subtasks: record.subtasks.into_iter().map(Subtask::from).collect(),
            time_spent_secs: record.time_spent,
        }
    }
}
