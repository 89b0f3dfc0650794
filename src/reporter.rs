use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::types::{MonitoringReport, ResearchReport, TradeEvent};

/// Directory for snapshot files.
pub const LOG_DIR: &str = "logs";

/// Emit a detected trade as a single JSON line to stdout.
pub fn report_trade(event: &TradeEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn write_snapshot<T: Serialize>(prefix: &str, snapshot: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(LOG_DIR).context("failed to create logs directory")?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = PathBuf::from(LOG_DIR).join(format!("{prefix}_{stamp}.json"));
    let contents =
        serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write the research-mode results to a timestamped snapshot file.
pub fn save_research_report(report: &ResearchReport) -> Result<()> {
    let path = write_snapshot("research", report)?;
    info!("research results saved to {}", path.display());
    Ok(())
}

/// Write the shutdown monitoring report to a timestamped snapshot file.
pub fn save_monitoring_report(report: &MonitoringReport) -> Result<()> {
    let path = write_snapshot("monitoring_report", report)?;
    info!("monitoring report saved to {}", path.display());
    Ok(())
}
