use clap::Subcommand;

use super::{open_app, print_json, remote_sync, runtime, CliResult};

#[derive(Subcommand)]
pub enum DistractionAction {
    /// Answer the distraction prompt for a finished pomodoro
    Report {
        /// Pomodoro number (default: the latest one)
        #[arg(long)]
        pomodoro: Option<u64>,
        /// There were distractions
        #[arg(long)]
        distracted: bool,
        /// The phone was used
        #[arg(long)]
        phone: bool,
    },
    /// Show recorded reports and the pomodoros that were prompted
    History,
}

pub fn run(action: DistractionAction) -> CliResult {
    let mut app = open_app()?;

    match action {
        DistractionAction::Report {
            pomodoro,
            distracted,
            phone,
        } => {
            let number = pomodoro.unwrap_or_else(|| app.workspace().pomodoro_count());
            let report = app.record_distraction(number, distracted, phone)?;
            print_json(&report)?;

            if let Some(sync) = remote_sync(&app) {
                let cache = app.workspace().cache();
                match runtime()?.block_on(sync.push_report(cache, &report)) {
                    Ok(true) => {}
                    Ok(false) => eprintln!(
                        "warning: pomodoro #{number} was not synced; report kept locally"
                    ),
                    Err(e) => eprintln!("warning: report not synced: {e}"),
                }
            }
        }
        DistractionAction::History => {
            let history = serde_json::json!({
                "prompted": app.workspace().sampler().history(),
                "reports": app.workspace().reports(),
            });
            print_json(&history)?;
        }
    }
    Ok(())
}
