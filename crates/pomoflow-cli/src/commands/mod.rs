pub mod auth;
pub mod config;
pub mod distraction;
pub mod stats;
pub mod task;
pub mod timer;

use pomoflow_core::{ApiClient, App, Config, Database, RemoteSync};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Application state backed by the on-disk database and config file.
pub fn open_app() -> Result<App<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    Ok(App::load(db, config)?)
}

/// Remote sync for the signed-in user, if a service URL is configured.
pub fn remote_sync(app: &App<Database>) -> Option<RemoteSync> {
    if !app.identity().is_authenticated() {
        return None;
    }
    let base_url = app.config().api.base_url.as_deref()?;
    match ApiClient::new(base_url, app.identity()) {
        Ok(client) => Some(RemoteSync::new(client)),
        Err(e) => {
            tracing::warn!("remote sync disabled: {e}");
            None
        }
    }
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
