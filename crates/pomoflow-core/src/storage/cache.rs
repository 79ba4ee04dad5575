//! Typed access to cached records in a [`KvStore`].
//!
//! Reads never fail: a missing or unreadable value falls back to an empty
//! default and the problem is logged. Writes are best-effort in the same
//! way; nothing here is retried.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use super::KvStore;
use crate::distraction::DistractionReport;
use crate::task::Task;
use crate::timer::ActiveSession;

pub const TASKS_KEY: &str = "pomodoro_tasks_cache";
pub const COUNT_KEY: &str = "pomodoro_count_cache";
pub const CURRENT_SESSION_KEY: &str = "current_pomodoro_cache";
pub const DISTRACTION_HISTORY_KEY: &str = "distraction_history_cache";
pub const DISTRACTION_REPORTS_KEY: &str = "distraction_reports_cache";
pub const REMOTE_POMODOROS_KEY: &str = "remote_pomodoro_ids";

const ALL_KEYS: [&str; 6] = [
    TASKS_KEY,
    COUNT_KEY,
    CURRENT_SESSION_KEY,
    DISTRACTION_HISTORY_KEY,
    DISTRACTION_REPORTS_KEY,
    REMOTE_POMODOROS_KEY,
];

#[derive(Debug)]
pub struct LocalCache<S> {
    store: S,
}

impl<S: KvStore> LocalCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_tasks(&self) -> Vec<Task> {
        self.read(TASKS_KEY).unwrap_or_default()
    }

    pub fn save_tasks(&self, tasks: &[Task]) {
        self.write(TASKS_KEY, &tasks);
    }

    /// Completed pomodoro counter; zero when absent or corrupt.
    pub fn load_count(&self) -> u64 {
        let raw = match self.store.get(COUNT_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = COUNT_KEY, "failed to read cache: {e}");
                return 0;
            }
        };
        match raw.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(s) => s.parse().unwrap_or_else(|_| {
                warn!(key = COUNT_KEY, value = s, "ignoring non-numeric counter");
                0
            }),
        }
    }

    pub fn save_count(&self, count: u64) {
        if let Err(e) = self.store.set(COUNT_KEY, &count.to_string()) {
            error!(key = COUNT_KEY, "failed to write cache: {e}");
        }
    }

    pub fn load_session(&self) -> Option<ActiveSession> {
        self.read(CURRENT_SESSION_KEY)
    }

    pub fn save_session(&self, session: &ActiveSession) {
        self.write(CURRENT_SESSION_KEY, session);
    }

    pub fn clear_session(&self) {
        self.remove(CURRENT_SESSION_KEY);
    }

    pub fn load_prompt_history(&self) -> Vec<u64> {
        self.read(DISTRACTION_HISTORY_KEY).unwrap_or_default()
    }

    pub fn save_prompt_history(&self, history: &[u64]) {
        self.write(DISTRACTION_HISTORY_KEY, &history);
    }

    pub fn load_reports(&self) -> Vec<DistractionReport> {
        self.read(DISTRACTION_REPORTS_KEY).unwrap_or_default()
    }

    pub fn append_report(&self, report: DistractionReport) {
        let mut reports = self.load_reports();
        reports.push(report);
        self.write(DISTRACTION_REPORTS_KEY, &reports);
    }

    /// Remote record id of the pomodoro with local number `pomodoro_number`,
    /// if it was synced.
    pub fn remote_pomodoro_id(&self, pomodoro_number: u64) -> Option<i64> {
        self.load_remote_pomodoros().get(&pomodoro_number).copied()
    }

    pub fn save_remote_pomodoro(&self, pomodoro_number: u64, remote_id: i64) {
        let mut ids = self.load_remote_pomodoros();
        ids.insert(pomodoro_number, remote_id);
        self.write(REMOTE_POMODOROS_KEY, &ids);
    }

    pub fn forget_remote_pomodoro(&self, pomodoro_number: u64) {
        let mut ids = self.load_remote_pomodoros();
        if ids.remove(&pomodoro_number).is_some() {
            self.write(REMOTE_POMODOROS_KEY, &ids);
        }
    }

    fn load_remote_pomodoros(&self) -> BTreeMap<u64, i64> {
        self.read(REMOTE_POMODOROS_KEY).unwrap_or_default()
    }

    /// Remove every cached record. Identity keys are left alone.
    pub fn clear(&self) {
        for key in ALL_KEYS {
            self.remove(key);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "failed to read cache: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "discarding unreadable cache entry: {e}");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key, "failed to encode cache entry: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &json) {
            error!(key, "failed to write cache: {e}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            error!(key, "failed to remove cache entry: {e}");
        }
    }
}
