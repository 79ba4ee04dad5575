use clap::Subcommand;
use pomoflow_core::app::completion_from_event;
use pomoflow_core::{CountdownOutcome, Event, Ticker, TimerMode};

use super::{open_app, print_json, remote_sync, runtime, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground. Ctrl-C pauses and saves; a
    /// later `run` resumes from the saved remaining time
    Run,
    /// Switch mode, discarding any countdown in progress
    Mode {
        /// pomodoro, short-break or long-break
        mode: String,
    },
    /// Set the session objective
    Objective {
        /// Free text
        text: String,
    },
    /// Focus a task, optionally narrowing to some of its subtasks
    Focus {
        /// Task ID
        task_id: i64,
        /// Subtask ID (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<i64>,
        /// Select every subtask of the task
        #[arg(long, conflicts_with = "subtasks")]
        all: bool,
    },
    /// Clear the focused task
    Unfocus,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        TimerAction::Status => print_json(&app.timer().state_event())?,
        TimerAction::Run => return run_foreground(&mut app),
        TimerAction::Mode { mode } => {
            let mode: TimerMode = mode.parse()?;
            print_json(&app.switch_mode(mode))?;
        }
        TimerAction::Objective { text } => print_json(&app.set_objective(text))?,
        TimerAction::Focus {
            task_id,
            subtasks,
            all,
        } => {
            let event = if all {
                app.select_all_subtasks(task_id)?
            } else {
                app.select_focus(task_id, subtasks)?
            };
            print_json(&event)?;
        }
        TimerAction::Unfocus => print_json(&app.clear_focus())?,
    }
    Ok(())
}

fn run_foreground(app: &mut pomoflow_core::App<pomoflow_core::Database>) -> CliResult {
    let rt = runtime()?;
    let mut ticker = Ticker::every_second();
    let mut uncounted = None;
    let mut completions = Vec::new();

    let outcome = rt.block_on(async {
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        app.run_countdown(&mut ticker, shutdown, |event| {
            print_event(event);
            if let Some(completion) = completion_from_event(event) {
                uncounted = Some(completion);
            } else if let Event::PomodoroCounted { count, .. } = event {
                if let Some(completion) = uncounted.take() {
                    completions.push((*count, completion));
                }
            }
        })
        .await
    });

    if outcome == CountdownOutcome::Interrupted {
        eprintln!("Timer paused with {}s remaining", app.timer().remaining_secs());
    }

    if let Some(sync) = remote_sync(app) {
        let cache = app.workspace().cache();
        for (number, completion) in &completions {
            if let Err(e) = rt.block_on(sync.push_completion(cache, *number, completion)) {
                eprintln!("warning: pomodoro #{number} not synced: {e}");
            }
        }
    }

    if let Some(number) = app.workspace().pending_prompt() {
        eprintln!(
            "Pomodoro #{number} finished. Were you distracted? \
             Run `pomoflow distraction report [--distracted] [--phone]`"
        );
    }
    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("failed to encode event: {e}"),
    }
}
