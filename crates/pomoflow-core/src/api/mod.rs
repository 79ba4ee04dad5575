//! Typed async client for the Pomoflow REST service.
//!
//! All endpoints live under `<base_url>/api/v1/`. Every request is scoped to
//! the caller's user id and carries a bearer token when one is set.
//!
//! ```rust,ignore
//! let client = ApiClient::new("http://localhost:8000", &identity)?;
//! let tasks = client.tasks().list(&TaskQuery::default()).await?;
//! let stats = client.statistics().get().await?;
//! ```

mod resources;
mod types;

pub use resources::{
    DeleteResponse, DistractionsApi, PomodorosApi, StatisticsApi, SubtasksApi, TasksApi,
};
pub use types::*;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::identity::SessionIdentity;

const API_PREFIX: &str = "api/v1/";
const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `detail` is the server's message when it sent one.
    #[error("{detail} (status {status})")]
    Status { status: u16, detail: String },

    /// 2xx response whose body did not match the expected record.
    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 204 where a body was required.
    #[error("server returned no content")]
    UnexpectedNoContent,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A successful response: either a decoded body or an explicit 204.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Data(T),
    NoContent,
}

impl<T> ApiResponse<T> {
    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiResponse::NoContent)
    }

    pub fn into_data(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Data(data) => Ok(data),
            ApiResponse::NoContent => Err(ApiError::UnexpectedNoContent),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    user_id: String,
    token: Option<String>,
}

impl ApiClient {
    /// Client scoped to `identity`: its user id (anonymous if signed out)
    /// and its token, if any.
    pub fn new(base_url: &str, identity: &SessionIdentity) -> Result<Self, ApiError> {
        Self::with_credentials(
            base_url,
            identity.user_id(),
            identity.token().map(str::to_owned),
        )
    }

    pub fn with_credentials(
        base_url: &str,
        user_id: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            user_id: user_id.into(),
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi::new(self)
    }

    pub fn subtasks(&self) -> SubtasksApi<'_> {
        SubtasksApi::new(self)
    }

    pub fn pomodoros(&self) -> PomodorosApi<'_> {
        PomodorosApi::new(self)
    }

    pub fn distractions(&self) -> DistractionsApi<'_> {
        DistractionsApi::new(self)
    }

    pub fn statistics(&self) -> StatisticsApi<'_> {
        StatisticsApi::new(self)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// `<base>/api/v1/<path>` with the given query pairs.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(API_PREFIX)?.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Query pair scoping a request to the current user.
    pub(crate) fn user_query(&self) -> (&'static str, String) {
        ("user_id", self.user_id.clone())
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "api response");

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let detail = error_detail(&body, status);
            warn!(status = status.as_u16(), %detail, "api request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map(ApiResponse::Data)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Message for a failed response: the JSON `detail` field, a generic status
/// message if the body is JSON without one, or "unknown error" otherwise.
fn error_detail(body: &[u8], status: StatusCode) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(json) => match json.get("detail") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_))) => {
                other.to_string()
            }
            _ => format!("HTTP error! status: {}", status.as_u16()),
        },
        Err(_) => UNKNOWN_ERROR.to_string(),
    }
}
