//! Application context.
//!
//! [`Workspace`] owns everything a completed work interval touches: the task
//! store, the completion counter, the distraction sampler and the cache they
//! are mirrored to. [`App`] pairs it with the session controller and the
//! signed-in identity, and persists the session after every change.
//!
//! State is loaded once at startup and written back on every change.

use std::future::Future;

use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use tracing::{debug, warn};

use crate::distraction::{DistractionReport, DistractionSampler, PromptDecision};
use crate::error::{ConfigError, ValidationError};
use crate::events::Event;
use crate::identity::SessionIdentity;
use crate::stats::Statistics;
use crate::storage::{Config, KvStore, LocalCache};
use crate::task::{Task, TaskStore};
use crate::timer::{CompletionHandler, PomodoroTimer, Ticker, TimerMode, WorkCompletion};

pub struct Workspace<S: KvStore> {
    cache: LocalCache<S>,
    tasks: TaskStore,
    pomodoro_count: u64,
    sampler: DistractionSampler,
    persist_history: bool,
    rng: Mcg128Xsl64,
    /// Counter value whose distraction prompt has not been answered yet.
    pending_prompt: Option<u64>,
}

impl<S: KvStore> Workspace<S> {
    pub fn load(store: S, config: &Config) -> Result<Self, ConfigError> {
        let cache = LocalCache::new(store);
        let pomodoro_count = cache.load_count();
        let mut sampler = config.distraction.sampler()?;
        let persist_history = config.distraction.persist_history;
        if persist_history {
            let stored = cache.load_prompt_history();
            let history: Vec<u64> = stored
                .iter()
                .copied()
                .filter(|&n| n <= pomodoro_count)
                .collect();
            if history.len() != stored.len() {
                warn!(
                    pomodoro_count,
                    dropped = stored.len() - history.len(),
                    "prompt history ahead of the counter; dropping stale entries"
                );
                cache.save_prompt_history(&history);
            }
            sampler = sampler.with_history(history);
        }
        let rng = match config.distraction.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Ok(Self {
            tasks: TaskStore::new(cache.load_tasks()),
            pomodoro_count,
            cache,
            sampler,
            persist_history,
            rng,
            pending_prompt: None,
        })
    }

    pub fn cache(&self) -> &LocalCache<S> {
        &self.cache
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn pomodoro_count(&self) -> u64 {
        self.pomodoro_count
    }

    pub fn sampler(&self) -> &DistractionSampler {
        &self.sampler
    }

    pub fn pending_prompt(&self) -> Option<u64> {
        self.pending_prompt
    }

    pub fn take_prompt(&mut self) -> Option<u64> {
        self.pending_prompt.take()
    }

    /// Apply a task mutation and mirror the result to the cache.
    pub fn update_tasks<T>(
        &mut self,
        mutate: impl FnOnce(&mut TaskStore) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let out = mutate(&mut self.tasks)?;
        self.cache.save_tasks(self.tasks.tasks());
        Ok(out)
    }

    /// Replace the whole task list, e.g. with one pulled from the service.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = TaskStore::new(tasks);
        self.cache.save_tasks(self.tasks.tasks());
    }

    /// Store the answer to a distraction prompt. `pomodoro_number` must name
    /// a pomodoro that has already been completed.
    pub fn record_distraction(
        &mut self,
        pomodoro_number: u64,
        had_distractions: bool,
        used_phone: bool,
    ) -> Result<DistractionReport, ValidationError> {
        if pomodoro_number == 0 || pomodoro_number > self.pomodoro_count {
            return Err(ValidationError::InvalidValue {
                field: "pomodoro_number".into(),
                message: format!(
                    "must be between 1 and {}, got {pomodoro_number}",
                    self.pomodoro_count
                ),
            });
        }
        let report = DistractionReport::new(pomodoro_number, had_distractions, used_phone);
        self.cache.append_report(report.clone());
        if self.pending_prompt == Some(pomodoro_number) {
            self.pending_prompt = None;
        }
        Ok(report)
    }

    pub fn reports(&self) -> Vec<DistractionReport> {
        self.cache.load_reports()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::from_local(self.tasks.tasks(), self.pomodoro_count, &self.reports())
    }
}

impl<S: KvStore> CompletionHandler for Workspace<S> {
    fn on_work_completed(&mut self, completion: &WorkCompletion) -> Vec<Event> {
        let at = completion.at;
        let mut events = Vec::new();

        self.pomodoro_count += 1;
        self.cache.save_count(self.pomodoro_count);
        events.push(Event::PomodoroCounted {
            count: self.pomodoro_count,
            at,
        });

        if let Some(task_id) = completion.task_id {
            match self
                .tasks
                .credit_focus(task_id, &completion.subtask_ids, completion.credited_secs)
            {
                Some(total) => {
                    self.cache.save_tasks(self.tasks.tasks());
                    events.push(Event::TimeCredited {
                        task_id,
                        subtask_ids: completion.subtask_ids.iter().copied().collect(),
                        credited_secs: completion.credited_secs,
                        task_total_secs: total,
                        at,
                    });
                }
                None => warn!(task_id, "focused task no longer exists; time not credited"),
            }
        }

        let n = self.pomodoro_count;
        let decision = self.sampler.evaluate(n, &mut self.rng);
        if decision.is_prompt() {
            if self.persist_history {
                self.cache.save_prompt_history(self.sampler.history());
            }
            self.pending_prompt = Some(n);
            events.push(Event::DistractionPromptDue {
                pomodoro_number: n,
                forced: decision == PromptDecision::Forced,
                at,
            });
        }
        events
    }
}

/// Why [`App::run_countdown`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// The interval ran down to zero.
    Finished,
    /// The shutdown future resolved first; the timer was paused.
    Interrupted,
}

pub struct App<S: KvStore> {
    timer: PomodoroTimer,
    workspace: Workspace<S>,
    identity: SessionIdentity,
    config: Config,
}

impl<S: KvStore> App<S> {
    /// Load identity, tasks, counter, history and the last session from
    /// `store`. A restored session is always paused.
    pub fn load(store: S, config: Config) -> Result<Self, ConfigError> {
        let identity = SessionIdentity::load(&store);
        let workspace = Workspace::load(store, &config)?;
        let durations = config.timer.durations();
        let mut timer = match workspace.cache().load_session() {
            Some(session) => PomodoroTimer::restore(durations, &session),
            None => PomodoroTimer::new(durations),
        };
        if let Some(task_id) = timer.task_id() {
            let selected = timer.subtask_ids().clone();
            let still_valid = match workspace.tasks().get(task_id) {
                Some(task) => timer.select_focus(task, selected).is_ok(),
                None => false,
            };
            if !still_valid {
                debug!(task_id, "dropping stale focus from restored session");
                timer.clear_focus();
            }
        }
        let app = Self {
            timer,
            workspace,
            identity,
            config,
        };
        app.persist_session();
        Ok(app)
    }

    pub fn timer(&self) -> &PomodoroTimer {
        &self.timer
    }

    pub fn workspace(&self) -> &Workspace<S> {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace<S> {
        &mut self.workspace
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ── Session controller ───────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.timer.start();
        self.persist_session();
        event
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.timer.pause();
        self.persist_session();
        event
    }

    pub fn switch_mode(&mut self, mode: TimerMode) -> Event {
        let event = self.timer.switch_mode(mode);
        self.persist_session();
        event
    }

    pub fn set_objective(&mut self, objective: impl Into<String>) -> Event {
        let event = self.timer.set_objective(objective);
        self.persist_session();
        event
    }

    pub fn select_focus(
        &mut self,
        task_id: i64,
        subtask_ids: impl IntoIterator<Item = i64>,
    ) -> Result<Event, ValidationError> {
        let task = self
            .workspace
            .tasks()
            .get(task_id)
            .ok_or(ValidationError::TaskNotFound(task_id))?;
        let event = self.timer.select_focus(task, subtask_ids)?;
        self.persist_session();
        Ok(event)
    }

    /// Focus a task together with every one of its subtasks.
    pub fn select_all_subtasks(&mut self, task_id: i64) -> Result<Event, ValidationError> {
        let ids = self
            .workspace
            .tasks()
            .get(task_id)
            .ok_or(ValidationError::TaskNotFound(task_id))?
            .subtask_ids();
        self.select_focus(task_id, ids)
    }

    pub fn clear_focus(&mut self) -> Event {
        let event = self.timer.clear_focus();
        self.persist_session();
        event
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.timer.tick(&mut self.workspace);
        self.persist_session();
        events
    }

    /// Start the timer and drive it from `ticker` until the interval
    /// finishes or `shutdown` resolves, passing every event to `on_event`.
    /// On shutdown the timer is paused and its state saved.
    pub async fn run_countdown<F>(
        &mut self,
        ticker: &mut Ticker,
        shutdown: F,
        mut on_event: impl FnMut(&Event),
    ) -> CountdownOutcome
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        if let Some(event) = self.start() {
            on_event(&event);
        }
        ticker.start();

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    ticker.stop();
                    if let Some(event) = self.pause() {
                        on_event(&event);
                    }
                    break CountdownOutcome::Interrupted;
                }
                alive = ticker.next_tick() => {
                    if !alive {
                        break CountdownOutcome::Interrupted;
                    }
                    for event in self.tick() {
                        on_event(&event);
                    }
                    if !self.timer.is_running() {
                        ticker.stop();
                        break CountdownOutcome::Finished;
                    }
                }
            }
        };
        debug!(?outcome, "countdown returned");
        outcome
    }

    // ── Tasks & distractions ─────────────────────────────────────────

    /// Mutate the task store. Focus on a task that no longer exists is
    /// cleared.
    pub fn update_tasks<T>(
        &mut self,
        mutate: impl FnOnce(&mut TaskStore) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let out = self.workspace.update_tasks(mutate)?;
        if let Some(task_id) = self.timer.task_id() {
            if self.workspace.tasks().get(task_id).is_none() {
                self.clear_focus();
            }
        }
        Ok(out)
    }

    /// Swap in a task list pulled from the service.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.workspace.replace_tasks(tasks);
        if let Some(task_id) = self.timer.task_id() {
            if self.workspace.tasks().get(task_id).is_none() {
                self.clear_focus();
            }
        }
    }

    pub fn take_prompt(&mut self) -> Option<u64> {
        self.workspace.take_prompt()
    }

    pub fn record_distraction(
        &mut self,
        pomodoro_number: u64,
        had_distractions: bool,
        used_phone: bool,
    ) -> Result<DistractionReport, ValidationError> {
        self.workspace
            .record_distraction(pomodoro_number, had_distractions, used_phone)
    }

    pub fn statistics(&self) -> Statistics {
        self.workspace.statistics()
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn sign_in(&mut self, token: impl Into<String>, user_id: impl Into<String>) {
        self.identity
            .set_session(self.workspace.cache().store(), token, user_id);
    }

    pub fn sign_out(&mut self) {
        self.identity.clear_session(self.workspace.cache().store());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_session(&self) {
        self.workspace.cache().save_session(&self.timer.snapshot());
    }
}

/// Completion payload rebuilt from a [`Event::WorkCompleted`], for callers
/// that only observed the event stream.
pub fn completion_from_event(event: &Event) -> Option<WorkCompletion> {
    match event {
        Event::WorkCompleted {
            objective,
            task_id,
            subtask_ids,
            credited_secs,
            at,
        } => Some(WorkCompletion {
            objective: objective.clone(),
            task_id: *task_id,
            subtask_ids: subtask_ids.iter().copied().collect(),
            credited_secs: *credited_secs,
            at: *at,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::storage::MemoryStore;

    fn config(focus: u64) -> Config {
        let mut config = Config::default();
        config.timer.focus_secs = focus;
        config.distraction.seed = Some(3);
        config
    }

    #[test]
    fn completion_without_focus_only_counts() {
        let mut app = App::load(MemoryStore::new(), config(2)).unwrap();
        app.start();
        app.tick();
        let events = app.tick();
        assert!(events.iter().any(|e| matches!(e, Event::PomodoroCounted { count: 1, .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::TimeCredited { .. })));
        assert_eq!(app.workspace().pomodoro_count(), 1);
        assert_eq!(app.workspace().cache().load_count(), 1);
    }

    #[test]
    fn deleting_focused_task_clears_focus() {
        let mut app = App::load(MemoryStore::new(), config(2)).unwrap();
        let id = app.update_tasks(|t| Ok(t.add_task("Doomed"))).unwrap();
        app.select_focus(id, []).unwrap();
        app.update_tasks(|t| t.delete_task(id)).unwrap();
        assert!(app.timer().task_id().is_none());
        assert!(app.workspace().cache().load_session().unwrap().task_id.is_none());
    }

    #[test]
    fn pulled_tasks_replace_local_ones() {
        let mut app = App::load(MemoryStore::new(), config(2)).unwrap();
        let id = app.update_tasks(|t| Ok(t.add_task("Local"))).unwrap();
        app.select_focus(id, []).unwrap();

        app.replace_tasks(vec![Task::new(5, "Remote")]);
        assert_eq!(app.workspace().tasks().len(), 1);
        assert!(app.timer().task_id().is_none());
        assert_eq!(app.workspace().cache().load_tasks()[0].title, "Remote");
    }

    #[test]
    fn unknown_task_focus_is_rejected() {
        let mut app = App::load(MemoryStore::new(), config(2)).unwrap();
        assert_eq!(
            app.select_focus(77, []).unwrap_err(),
            ValidationError::TaskNotFound(77)
        );
    }

    #[test]
    fn history_not_loaded_when_disabled() {
        let store = MemoryStore::new();
        store
            .set(crate::storage::DISTRACTION_HISTORY_KEY, "[1,2,3]")
            .unwrap();
        let mut cfg = config(2);
        cfg.distraction.persist_history = false;
        let app = App::load(store, cfg).unwrap();
        assert!(app.workspace().sampler().history().is_empty());
    }

    #[test]
    fn prompt_answer_clears_pending() {
        let mut app = App::load(MemoryStore::new(), config(1)).unwrap();
        let mut prompted = None;
        for _ in 0..10 {
            app.start();
            app.tick();
            if let Some(n) = app.workspace().pending_prompt() {
                prompted = Some(n);
                break;
            }
        }
        let n = prompted.expect("a group of ten always prompts");
        app.record_distraction(n, true, false).unwrap();
        assert!(app.workspace().pending_prompt().is_none());
        assert_eq!(app.workspace().reports().len(), 1);
    }

    #[test]
    fn report_for_unfinished_pomodoro_is_rejected() {
        let mut app = App::load(MemoryStore::new(), config(1)).unwrap();
        assert!(app.record_distraction(1, true, false).is_err());

        app.start();
        app.tick();
        assert!(app.record_distraction(0, true, false).is_err());
        assert!(app.record_distraction(2, false, true).is_err());
        assert!(app.workspace().reports().is_empty());

        let report = app.record_distraction(1, false, true).unwrap();
        assert_eq!(report.pomodoro_number, 1);
        assert_eq!(app.workspace().reports(), vec![report]);
    }

    #[test]
    fn history_beyond_counter_is_dropped_on_load() {
        let store = MemoryStore::new();
        store
            .set(crate::storage::DISTRACTION_HISTORY_KEY, "[2,5,9,14]")
            .unwrap();
        store.set(crate::storage::COUNT_KEY, "9").unwrap();
        let app = App::load(&store, config(2)).unwrap();
        assert_eq!(app.workspace().sampler().history(), &[2, 5, 9]);
        assert_eq!(app.workspace().cache().load_prompt_history(), vec![2, 5, 9]);
    }

    #[test]
    fn rebuilds_completion_from_event() {
        let event = Event::WorkCompleted {
            objective: "x".into(),
            task_id: Some(1),
            subtask_ids: vec![2, 3],
            credited_secs: 60,
            at: Utc::now(),
        };
        let completion = completion_from_event(&event).unwrap();
        assert_eq!(completion.subtask_ids.len(), 2);
        assert!(completion_from_event(&Event::ObjectiveChanged {
            objective: String::new(),
            at: Utc::now()
        })
        .is_none());
    }
}
