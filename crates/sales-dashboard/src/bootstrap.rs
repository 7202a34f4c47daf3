use std::path::PathBuf;

use anyhow::Context;

/// File name of the dashboard log inside `~/.sales-dashboard/logs/`.
pub const LOG_FILE_NAME: &str = "sales-dashboard.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.sales-dashboard/logs/` exists and return it.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let logs = home.join(".sales-dashboard").join("logs");
    std::fs::create_dir_all(&logs)
        .with_context(|| format!("failed to create {}", logs.display()))?;
    Ok(logs)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
