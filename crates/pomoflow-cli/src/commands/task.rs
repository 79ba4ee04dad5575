//! Task management commands for CLI.

use clap::Subcommand;
use pomoflow_core::task::{DEFAULT_SUBTASK_TITLE, DEFAULT_TASK_TITLE};
use pomoflow_core::{Task, TaskCategory};

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Case-insensitive title filter
        #[arg(long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a new task
    Add {
        /// Task title
        #[arg(default_value = DEFAULT_TASK_TITLE)]
        title: String,
        /// personal, laboral or otro (default: personal)
        #[arg(long)]
        category: Option<String>,
    },
    /// Rename a task
    Rename {
        /// Task ID
        id: i64,
        /// New title
        title: String,
    },
    /// Toggle a task's completed flag
    Toggle {
        /// Task ID
        id: i64,
    },
    /// Change a task's category
    Category {
        /// Task ID
        id: i64,
        /// personal, laboral or otro
        category: String,
        /// Custom label (only kept for otro)
        #[arg(long)]
        label: Option<String>,
    },
    /// Delete a task and its subtasks
    Delete {
        /// Task ID
        id: i64,
    },
    /// Archive a task
    Archive {
        /// Task ID
        id: i64,
    },
    /// Subtask management
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a subtask
    Add {
        /// Parent task ID
        task_id: i64,
        /// Subtask title
        #[arg(default_value = DEFAULT_SUBTASK_TITLE)]
        title: String,
    },
    /// Toggle a subtask; the parent is complete when all subtasks are
    Toggle {
        /// Parent task ID
        task_id: i64,
        /// Subtask ID
        subtask_id: i64,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        TaskAction::List { search, json } => {
            let store = app.workspace().tasks();
            let tasks: Vec<&Task> = match search.as_deref() {
                Some(query) => store.search(query),
                None => store.tasks().iter().collect(),
            };
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks");
            } else {
                for task in tasks {
                    print_task_line(task);
                }
            }
        }
        TaskAction::Add { title, category } => {
            let category = category
                .as_deref()
                .map(str::parse::<TaskCategory>)
                .transpose()?;
            let id = app.update_tasks(|store| {
                let id = store.add_task(title);
                if let Some(category) = category {
                    store.set_category(id, category)?;
                }
                Ok(id)
            })?;
            println!("Task created: {id}");
            print_task(&app, id)?;
        }
        TaskAction::Rename { id, title } => {
            app.update_tasks(|store| store.rename_task(id, title))?;
            print_task(&app, id)?;
        }
        TaskAction::Toggle { id } => {
            let completed = app.update_tasks(|store| store.toggle_task(id))?;
            println!("Task {id} completed: {completed}");
        }
        TaskAction::Category {
            id,
            category,
            label,
        } => {
            let category: TaskCategory = category.parse()?;
            app.update_tasks(|store| {
                store.set_category(id, category)?;
                match label {
                    Some(label) if category == TaskCategory::Other => {
                        store.set_custom_category(id, label)
                    }
                    _ => Ok(()),
                }
            })?;
            print_task(&app, id)?;
        }
        TaskAction::Delete { id } => {
            app.update_tasks(|store| store.delete_task(id))?;
            println!("Task deleted: {id}");
        }
        TaskAction::Archive { id } => {
            app.update_tasks(|store| store.archive_task(id))?;
            println!("Task archived: {id}");
        }
        TaskAction::Subtask { action } => match action {
            SubtaskAction::Add { task_id, title } => {
                let id = app.update_tasks(|store| store.add_subtask(task_id, title))?;
                println!("Subtask created: {id}");
                print_task(&app, task_id)?;
            }
            SubtaskAction::Toggle {
                task_id,
                subtask_id,
            } => {
                let parent = app.update_tasks(|store| store.toggle_subtask(task_id, subtask_id))?;
                println!("Subtask {subtask_id} toggled; task {task_id} completed: {parent}");
            }
        },
    }
    Ok(())
}

fn print_task<S: pomoflow_core::KvStore>(app: &pomoflow_core::App<S>, id: i64) -> CliResult {
    match app.workspace().tasks().get(id) {
        Some(task) => print_json(task),
        None => Err(format!("Task not found: {id}").into()),
    }
}

fn print_task_line(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!(
        "{:>14}  [{mark}] {}  ({})  {}  {:.0}%",
        task.id,
        task.title,
        task.category_label(),
        format_secs(task.time_spent_secs),
        task.progress_pct(),
    );
    for sub in &task.subtasks {
        let mark = if sub.completed { "x" } else { " " };
        println!(
            "{:>14}    [{mark}] {}  {}",
            sub.id,
            sub.title,
            format_secs(sub.time_spent_secs)
        );
    }
}

fn format_secs(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
