use clap::Args;
use pomoflow_core::{ApiClient, Statistics};

use super::{open_app, print_json, runtime, CliResult};

#[derive(Args)]
pub struct StatsArgs {
    /// Fetch statistics from the sync service instead of local data
    #[arg(long)]
    remote: bool,
    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs) -> CliResult {
    let app = open_app()?;

    let stats: Statistics = if args.remote {
        let base_url = app
            .config()
            .api
            .base_url
            .as_deref()
            .ok_or("api.base_url is not configured")?;
        let client = ApiClient::new(base_url, app.identity())?;
        runtime()?.block_on(client.statistics().get())?
    } else {
        app.statistics()
    };

    if args.json {
        return print_json(&stats);
    }

    println!("Pomodoros:     {}", stats.total_pomodoros);
    println!("Focus time:    {} min", stats.total_time_spent / 60);
    println!("Distracted:    {}", stats.distractions_count);
    println!("Phone used:    {}", stats.phone_usage_count);
    for category in &stats.category_stats {
        println!(
            "  {:<16} {:>4} tasks  {:>6} min",
            category.category,
            category.tasks_count,
            category.total_time_spent / 60
        );
    }
    Ok(())
}
