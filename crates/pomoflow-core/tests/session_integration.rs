//! Integration tests for the session controller driving the workspace.
//!
//! These exercise the full completion path: ticking the timer down,
//! crediting focused tasks, counting pomodoros and persisting everything
//! through a key-value store.

use std::time::Duration;

use pomoflow_core::storage::{
    COUNT_KEY, CURRENT_SESSION_KEY, DISTRACTION_HISTORY_KEY, TASKS_KEY,
};
use pomoflow_core::{
    App, Config, CountdownOutcome, Database, Event, KvStore, MemoryStore, Ticker, TimerMode,
};

const FOCUS: u64 = 5;

fn config() -> Config {
    let mut config = Config::default();
    config.timer.focus_secs = FOCUS;
    config.timer.long_break_secs = 8;
    config.distraction.seed = Some(11);
    config
}

fn run_interval<S: KvStore>(app: &mut App<S>) -> Vec<Event> {
    app.start();
    let mut events = Vec::new();
    for _ in 0..FOCUS {
        events.extend(app.tick());
    }
    events
}

#[test]
fn test_two_subtask_focus_scenario() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    let task = app.update_tasks(|t| Ok(t.add_task("Implement auth"))).unwrap();
    let jwt = app.update_tasks(|t| t.add_subtask(task, "Configure JWT")).unwrap();
    let mw = app.update_tasks(|t| t.add_subtask(task, "Middleware")).unwrap();

    app.select_all_subtasks(task).unwrap();
    let events = run_interval(&mut app);

    let completed = events
        .iter()
        .filter(|e| matches!(e, Event::WorkCompleted { .. }))
        .count();
    assert_eq!(completed, 1);

    let t = app.workspace().tasks().get(task).unwrap();
    assert_eq!(t.subtask(jwt).unwrap().time_spent_secs, FOCUS);
    assert_eq!(t.subtask(mw).unwrap().time_spent_secs, FOCUS);
    assert_eq!(t.time_spent_secs, 2 * FOCUS);
    assert_eq!(app.workspace().pomodoro_count(), 1);

    assert!(!app.timer().is_running());
    assert_eq!(app.timer().remaining_secs(), FOCUS);
    assert_eq!(app.timer().mode(), TimerMode::Work);
}

#[test]
fn test_partial_focus_keeps_sum_invariant() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    let task = app.update_tasks(|t| Ok(t.add_task("Docs"))).unwrap();
    let a = app.update_tasks(|t| t.add_subtask(task, "a")).unwrap();
    let b = app.update_tasks(|t| t.add_subtask(task, "b")).unwrap();

    app.select_focus(task, [a]).unwrap();
    run_interval(&mut app);
    app.select_focus(task, [a, b]).unwrap();
    run_interval(&mut app);

    let t = app.workspace().tasks().get(task).unwrap();
    assert_eq!(t.subtask(a).unwrap().time_spent_secs, 2 * FOCUS);
    assert_eq!(t.subtask(b).unwrap().time_spent_secs, FOCUS);
    assert_eq!(t.time_spent_secs, t.subtask_time_sum());
    assert_eq!(app.workspace().pomodoro_count(), 2);
}

#[test]
fn test_switch_mode_mid_countdown_never_credits() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    let task = app.update_tasks(|t| Ok(t.add_task("Solo"))).unwrap();
    app.select_focus(task, []).unwrap();

    app.start();
    for _ in 0..FOCUS - 1 {
        app.tick();
    }
    app.switch_mode(TimerMode::ShortBreak);
    app.switch_mode(TimerMode::Work);
    for _ in 0..FOCUS {
        assert!(app.tick().is_empty());
    }

    assert_eq!(app.workspace().pomodoro_count(), 0);
    assert_eq!(app.workspace().tasks().get(task).unwrap().time_spent_secs, 0);
}

#[test]
fn test_breaks_are_not_counted() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    app.switch_mode(TimerMode::LongBreak);
    app.start();
    let mut events = Vec::new();
    for _ in 0..8 {
        events.extend(app.tick());
    }
    assert!(matches!(
        events.as_slice(),
        [Event::BreakCompleted {
            mode: TimerMode::LongBreak,
            ..
        }]
    ));
    assert_eq!(app.workspace().pomodoro_count(), 0);
}

#[test]
fn test_state_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomoflow.db");

    let (task, session) = {
        let mut app = App::load(Database::open_at(&path).unwrap(), config()).unwrap();
        let task = app.update_tasks(|t| Ok(t.add_task("Persist me"))).unwrap();
        let sub = app.update_tasks(|t| t.add_subtask(task, "child")).unwrap();
        app.select_focus(task, [sub]).unwrap();
        app.set_objective("finish the chapter");
        run_interval(&mut app);
        app.start();
        app.tick();
        (task, app.timer().snapshot())
    };

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.get(COUNT_KEY).unwrap().as_deref(), Some("1"));
    assert!(db.get(TASKS_KEY).unwrap().is_some());
    assert!(db.get(CURRENT_SESSION_KEY).unwrap().is_some());

    let app = App::load(db, config()).unwrap();
    assert_eq!(app.workspace().pomodoro_count(), 1);
    assert_eq!(
        app.workspace().tasks().get(task).unwrap().time_spent_secs,
        FOCUS
    );

    let restored = app.timer().snapshot();
    assert!(session.is_running);
    assert!(!restored.is_running);
    assert_eq!(restored.remaining_secs, FOCUS - 1);
    assert_eq!(restored.objective, session.objective);
    assert_eq!(restored.task_id, session.task_id);
    assert_eq!(restored.subtask_ids, session.subtask_ids);
}

#[test]
fn test_active_session_roundtrip_through_store() {
    let store = MemoryStore::new();
    let mut app = App::load(&store, config()).unwrap();
    let task = app.update_tasks(|t| Ok(t.add_task("Roundtrip"))).unwrap();
    app.select_focus(task, []).unwrap();
    app.set_objective("a".repeat(2000));
    app.switch_mode(TimerMode::ShortBreak);

    let stored = app.workspace().cache().load_session().unwrap();
    assert_eq!(stored, app.timer().snapshot());

    let json = store.get(CURRENT_SESSION_KEY).unwrap().unwrap();
    let decoded: pomoflow_core::ActiveSession = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, stored);
}

#[test]
fn test_every_group_of_ten_prompts_three_times() {
    let mut cfg = config();
    cfg.timer.focus_secs = 1;
    let mut app = App::load(MemoryStore::new(), cfg).unwrap();

    let mut prompts = Vec::new();
    for _ in 0..30 {
        app.start();
        for event in app.tick() {
            if let Event::DistractionPromptDue { pomodoro_number, .. } = event {
                prompts.push(pomodoro_number);
            }
        }
    }
    for group in 0..3u64 {
        let in_group = prompts
            .iter()
            .filter(|&&n| (n - 1) / 10 == group)
            .count();
        assert_eq!(in_group, 3, "group {group}: {prompts:?}");
    }
    assert_eq!(app.workspace().sampler().history(), prompts.as_slice());
    assert_eq!(app.workspace().cache().load_prompt_history(), prompts);
}

#[test]
fn test_corrupt_counter_resets_prompt_history() {
    let store = MemoryStore::new();
    store.set(DISTRACTION_HISTORY_KEY, "[2,5,9]").unwrap();
    store.set(COUNT_KEY, "garbage").unwrap();

    let mut cfg = config();
    cfg.timer.focus_secs = 1;
    let mut app = App::load(&store, cfg).unwrap();
    assert_eq!(app.workspace().pomodoro_count(), 0);
    assert!(app.workspace().sampler().history().is_empty());

    let mut prompts = Vec::new();
    for _ in 0..10 {
        app.start();
        for event in app.tick() {
            if let Event::DistractionPromptDue { pomodoro_number, .. } = event {
                prompts.push(pomodoro_number);
            }
        }
    }
    assert_eq!(app.workspace().pomodoro_count(), 10);
    assert_eq!(prompts.len(), 3, "{prompts:?}");
    assert_eq!(app.workspace().cache().load_prompt_history(), prompts);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_runs_to_completion() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    let mut ticker = Ticker::every_second();
    let mut seen = Vec::new();

    let outcome = app
        .run_countdown(&mut ticker, std::future::pending(), |e| seen.push(e.clone()))
        .await;

    assert_eq!(outcome, CountdownOutcome::Finished);
    assert!(!ticker.is_running());
    assert!(matches!(seen.first(), Some(Event::TimerStarted { .. })));
    assert_eq!(
        seen.iter()
            .filter(|e| matches!(e, Event::WorkCompleted { .. }))
            .count(),
        1
    );
    assert_eq!(app.workspace().pomodoro_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_shutdown_pauses_and_saves() {
    let mut app = App::load(MemoryStore::new(), config()).unwrap();
    let mut ticker = Ticker::every_second();
    let mut seen = Vec::new();

    let shutdown = tokio::time::sleep(Duration::from_millis(2500));
    let outcome = app
        .run_countdown(&mut ticker, shutdown, |e| seen.push(e.clone()))
        .await;

    assert_eq!(outcome, CountdownOutcome::Interrupted);
    assert!(!app.timer().is_running());
    assert_eq!(app.timer().remaining_secs(), FOCUS - 2);
    assert!(matches!(seen.last(), Some(Event::TimerPaused { .. })));

    let saved = app.workspace().cache().load_session().unwrap();
    assert!(!saved.is_running);
    assert_eq!(saved.remaining_secs, FOCUS - 2);
    assert_eq!(app.workspace().pomodoro_count(), 0);
}
