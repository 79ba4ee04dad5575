//! Per-resource endpoint groups, borrowed from an [`ApiClient`].

use reqwest::Method;

use super::types::*;
use super::{ApiClient, ApiError, ApiResponse};
use crate::stats::Statistics;

/// Body returned by deletes that do not answer 204.
pub type DeleteResponse = ApiResponse<serde_json::Value>;

pub struct TasksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TasksApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, ApiError> {
        let mut params = vec![self.client.user_query()];
        if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
            params.push(("search", search.clone()));
        }
        let url = self.client.endpoint("tasks", &params)?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn get(&self, task_id: i64) -> Result<TaskRecord, ApiError> {
        let url = self.client.endpoint(&format!("tasks/{task_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn create(&self, task: NewTask) -> Result<TaskRecord, ApiError> {
        let body = NewTask {
            user_id: Some(self.client.user_id().to_string()),
            ..task
        };
        let url = self.client.endpoint("tasks", &[])?;
        self.client
            .execute(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_data()
    }

    pub async fn update(&self, task_id: i64, patch: &TaskPatch) -> Result<TaskRecord, ApiError> {
        let url = self
            .client
            .endpoint(&format!("tasks/{task_id}"), &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::PUT, url).json(patch))
            .await?
            .into_data()
    }

    pub async fn delete(&self, task_id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self
            .client
            .endpoint(&format!("tasks/{task_id}"), &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::DELETE, url))
            .await
    }
}

pub struct SubtasksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SubtasksApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_for_task(&self, task_id: i64) -> Result<Vec<SubtaskRecord>, ApiError> {
        let url = self
            .client
            .endpoint(&format!("subtasks/task/{task_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn get(&self, subtask_id: i64) -> Result<SubtaskRecord, ApiError> {
        let url = self.client.endpoint(&format!("subtasks/{subtask_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    /// Subtask records have no owner field; the user id travels as a query
    /// parameter instead.
    pub async fn create(&self, subtask: &NewSubtask) -> Result<SubtaskRecord, ApiError> {
        let url = self
            .client
            .endpoint("subtasks", &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::POST, url).json(subtask))
            .await?
            .into_data()
    }

    pub async fn update(
        &self,
        subtask_id: i64,
        patch: &SubtaskPatch,
    ) -> Result<SubtaskRecord, ApiError> {
        let url = self.client.endpoint(
            &format!("subtasks/{subtask_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::PUT, url).json(patch))
            .await?
            .into_data()
    }

    pub async fn delete(&self, subtask_id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self.client.endpoint(
            &format!("subtasks/{subtask_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::DELETE, url))
            .await
    }
}

pub struct PomodorosApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PomodorosApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &PomodoroQuery) -> Result<Vec<PomodoroRecord>, ApiError> {
        let mut params = vec![self.client.user_query()];
        if let Some(task_id) = query.task_id {
            params.push(("task_id", task_id.to_string()));
        }
        if let Some(completed) = query.completed {
            params.push(("completed", completed.to_string()));
        }
        let url = self.client.endpoint("pomodoros", &params)?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn get(&self, pomodoro_id: i64) -> Result<PomodoroRecord, ApiError> {
        let url = self
            .client
            .endpoint(&format!("pomodoros/{pomodoro_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    /// Completed pomodoros for the current user.
    pub async fn count(&self) -> Result<u64, ApiError> {
        let url = self
            .client
            .endpoint("pomodoros/count", &[self.client.user_query()])?;
        let count: PomodoroCount = self
            .client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()?;
        Ok(count.count)
    }

    pub async fn create(&self, pomodoro: NewPomodoro) -> Result<PomodoroRecord, ApiError> {
        let body = NewPomodoro {
            user_id: Some(self.client.user_id().to_string()),
            ..pomodoro
        };
        let url = self.client.endpoint("pomodoros", &[])?;
        self.client
            .execute(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_data()
    }

    pub async fn update(
        &self,
        pomodoro_id: i64,
        patch: &PomodoroPatch,
    ) -> Result<PomodoroRecord, ApiError> {
        let url = self.client.endpoint(
            &format!("pomodoros/{pomodoro_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::PUT, url).json(patch))
            .await?
            .into_data()
    }

    pub async fn delete(&self, pomodoro_id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self.client.endpoint(
            &format!("pomodoros/{pomodoro_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::DELETE, url))
            .await
    }

    /// Mark a pomodoro finished, optionally with the time actually spent.
    pub async fn complete(
        &self,
        pomodoro_id: i64,
        actual_duration: Option<u64>,
    ) -> Result<PomodoroRecord, ApiError> {
        let body = PomodoroCompletion {
            pomodoro_id,
            actual_duration,
        };
        let url = self
            .client
            .endpoint("pomodoros/complete", &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_data()
    }
}

pub struct DistractionsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DistractionsApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<DistractionRecord>, ApiError> {
        let url = self
            .client
            .endpoint("distractions", &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn list_for_pomodoro(
        &self,
        pomodoro_id: i64,
    ) -> Result<Vec<DistractionRecord>, ApiError> {
        let url = self
            .client
            .endpoint(&format!("distractions/pomodoro/{pomodoro_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn get(&self, distraction_id: i64) -> Result<DistractionRecord, ApiError> {
        let url = self
            .client
            .endpoint(&format!("distractions/{distraction_id}"), &[])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }

    pub async fn create(&self, distraction: NewDistraction) -> Result<DistractionRecord, ApiError> {
        let body = NewDistraction {
            user_id: Some(self.client.user_id().to_string()),
            ..distraction
        };
        let url = self.client.endpoint("distractions", &[])?;
        self.client
            .execute(self.client.request(Method::POST, url).json(&body))
            .await?
            .into_data()
    }

    pub async fn update(
        &self,
        distraction_id: i64,
        patch: &DistractionPatch,
    ) -> Result<DistractionRecord, ApiError> {
        let url = self.client.endpoint(
            &format!("distractions/{distraction_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::PUT, url).json(patch))
            .await?
            .into_data()
    }

    pub async fn delete(&self, distraction_id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self.client.endpoint(
            &format!("distractions/{distraction_id}"),
            &[self.client.user_query()],
        )?;
        self.client
            .execute(self.client.request(Method::DELETE, url))
            .await
    }
}

pub struct StatisticsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> StatisticsApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<Statistics, ApiError> {
        let url = self
            .client
            .endpoint("statistics", &[self.client.user_query()])?;
        self.client
            .execute(self.client.request(Method::GET, url))
            .await?
            .into_data()
    }
}
