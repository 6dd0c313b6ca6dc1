use std::process::ExitCode;

use kbo_schedule_sync::config::SyncConfig;
use kbo_schedule_sync::error::SyncError;
use kbo_schedule_sync::naver::NaverSource;
use kbo_schedule_sync::reconcile::{ReconcileReport, Reconciler};
use kbo_schedule_sync::store::JsonFileStore;
use tracing::{error, info, instrument};
use tracing_subscriber::EnvFilter;

#[instrument(skip(args))]
fn run(args: &[String]) -> Result<ReconcileReport, SyncError> {
    let config = SyncConfig::load(args)?;
    let window = config.window(chrono::Utc::now())?;
    info!(
        schedule = %config.schedule_path.display(),
        sport_id = %config.sport_id,
        window = %window,
        mode = ?config.mode,
        "Starting schedule update"
    );

    let store = JsonFileStore::new(&config.schedule_path);
    let source = NaverSource::new(&config.api_base_url, config.timeout());
    let mut reconciler = Reconciler::new(store, source, config.reconcile_settings());
    reconciler.reconcile(window)
}

fn main() -> ExitCode {
    // Structured logging; the scheduler running us stamps each line.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_current_span(false)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .try_init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(report) => {
            info!(summary = %report, "Schedule update complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Schedule update failed");
            ExitCode::FAILURE
        }
    }
}
