mod bootstrap;
mod logging;

use anyhow::{Context, Result};
use sales_core::settings::Settings;
use sales_data::analysis::ReportOptions;
use sales_data::contribution::CutoffRule;
use sales_runtime::data_manager::{DataManager, ParquetSource};
use sales_runtime::session::DashboardSession;
use sales_ui::app::{App, View};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let logs_dir = bootstrap::ensure_directories()?;
    let log_file = settings
        .log_file
        .clone()
        .unwrap_or_else(|| logs_dir.join(bootstrap::LOG_FILE_NAME));
    logging::setup_logging(&settings.log_level, Some(log_file.as_path()))?;

    tracing::info!("Sales Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, View: {}, Threshold: {}%, Cutoff: {}, Theme: {}",
        settings.data_file.display(),
        settings.view,
        settings.threshold,
        settings.cutoff,
        settings.theme
    );

    if !settings.data_file.exists() {
        tracing::warn!(
            path = %settings.data_file.display(),
            "data file not found; run sales-convert first"
        );
    }

    let options = ReportOptions {
        threshold_pct: settings.threshold,
        cutoff: CutoffRule::from_name(&settings.cutoff).unwrap_or_default(),
    };
    let data = DataManager::new(ParquetSource::new(settings.data_file.clone()), settings.cache_ttl);
    let app = App::new(
        DashboardSession::new(data, options),
        &settings.theme,
        View::from_name(&settings.view),
    );

    // The TUI exits on 'q' / Ctrl+C itself; the signal arm covers a SIGINT
    // delivered from outside the terminal. Dropping the app restores the
    // terminal either way.
    tokio::select! {
        result = app.run() => {
            result.context("terminal UI failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    tracing::info!("Sales Dashboard stopped");
    Ok(())
}
