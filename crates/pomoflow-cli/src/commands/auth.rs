use clap::Subcommand;
use pomoflow_core::Task;

use super::{open_app, print_json, remote_sync, runtime, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a session token for the sync service
    Login {
        /// Bearer token issued by the service
        #[arg(long)]
        token: String,
        /// Remote user ID
        #[arg(long)]
        user_id: String,
        /// Replace local tasks with the remote task list
        #[arg(long)]
        pull: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the current user
    Whoami,
}

pub fn run(action: AuthAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        AuthAction::Login {
            token,
            user_id,
            pull,
        } => {
            app.sign_in(token, user_id);
            println!("Signed in as {}", app.identity().user_id());

            if pull {
                let sync = remote_sync(&app).ok_or("api.base_url is not configured")?;
                let tasks: Vec<Task> = runtime()?.block_on(sync.pull_tasks())?;
                println!("Pulled {} tasks", tasks.len());
                app.replace_tasks(tasks);
            }
        }
        AuthAction::Logout => {
            app.sign_out();
            println!("Signed out");
        }
        AuthAction::Whoami => print_json(&app.identity().current_user())?,
    }
    Ok(())
}
