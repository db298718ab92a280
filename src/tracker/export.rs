use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::info;

use crate::{
    storage::{entities::SessionLogEntry, log_storage::LogStorage},
    utils::time::date_to_record_name,
};

pub const EMPTY_EXPORT_MESSAGE: &str = "No logs!";

const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, PartialEq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// The day has no sessions, nothing was written.
    Empty,
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("afk-logs-{}.csv", date_to_record_name(date))
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(EXPORT_TIME_FORMAT).to_string()
}

/// Writes a daily log as a CSV table: `Start,Active,AFK,End`, one row per session in log order.
pub fn write_csv(entries: &[SessionLogEntry], writer: impl io::Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Start", "Active", "AFK", "End"])?;
    for entry in entries {
        wtr.write_record(&[
            format_time(entry.start),
            format!("{:.2}", entry.active),
            format!("{:.2}", entry.afk),
            format_time(entry.end),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports the log of `date` into `out_dir`.
pub async fn export_day(
    storage: &impl LogStorage,
    date: NaiveDate,
    out_dir: &Path,
) -> Result<ExportOutcome> {
    let entries = storage.get_data_for(date).await?;
    if entries.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let mut buffer = vec![];
    write_csv(&entries, &mut buffer)?;

    let path = out_dir.join(export_file_name(date));
    tokio::fs::write(&path, buffer)
        .await
        .with_context(|| format!("Failed to write export file {path:?}"))?;
    info!("Exported {} sessions into {path:?}", entries.len());
    Ok(ExportOutcome::Written(path))
}
