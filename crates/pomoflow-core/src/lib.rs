//! # Pomoflow Core Library
//!
//! This library provides the core logic for the Pomoflow focus timer. All
//! operations are available through the standalone `pomoflow` CLI, which is
//! a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session controller**: a countdown state machine that requires the
//!   caller to invoke `tick()` once per second, fed by a cancellable tokio
//!   [`Ticker`]
//! - **Task store**: tasks and subtasks with focus-time accounting
//! - **Distraction sampling**: decides after which pomodoros to ask for a
//!   distraction self-report
//! - **Storage**: SQLite key-value cache and TOML configuration
//! - **API**: typed client for the REST service, used when signed in
//!
//! ## Key Components
//!
//! - [`App`]: loads state at startup and persists it on every change
//! - [`PomodoroTimer`]: core timer state machine
//! - [`TaskStore`]: task list mutations
//! - [`DistractionSampler`]: grouped prompt sampling
//! - [`Database`]: key-value persistence
//! - [`Config`]: application configuration management
//! - [`ApiClient`]: REST client

pub mod api;
pub mod app;
pub mod distraction;
pub mod error;
pub mod events;
pub mod identity;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use api::{ApiClient, ApiError, ApiResponse};
pub use app::{App, CountdownOutcome, Workspace};
pub use distraction::{DistractionReport, DistractionSampler, PromptDecision};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use identity::{CurrentUser, SessionIdentity, ANONYMOUS_USER_ID};
pub use stats::Statistics;
pub use storage::{Config, Database, KvStore, LocalCache, MemoryStore};
pub use sync::RemoteSync;
pub use task::{Subtask, Task, TaskCategory, TaskStore};
pub use timer::{ActiveSession, ModeDurations, PomodoroTimer, Ticker, TimerMode, WorkCompletion};
