use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{
    storage::log_storage::{LogStorage, LogStorageImpl},
    tracker::{
        export::{export_day, ExportOutcome, EMPTY_EXPORT_MESSAGE},
        progress::{DailyProgress, DailyTotals},
    },
    utils::time::format_clock,
};

use super::{
    dates::{parse_day_or_today, DateStyle, DATE_HELP},
    AppContext,
};

#[derive(Debug, Parser)]
pub struct DayCommand {
    #[arg(long, short, help = DATE_HELP)]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct ExportCommand {
    #[command(flatten)]
    day: DayCommand,
    #[arg(long, short, help = "Directory for the CSV file. Defaults to the configured export directory or the current one")]
    out: Option<PathBuf>,
}

/// Command to process `stats` command. Prints every committed session of a day and the totals.
pub async fn process_stats_command(context: &AppContext, command: DayCommand) -> Result<()> {
    let date = parse_day_or_today(command.date.as_deref(), command.date_style)?;
    let storage = LogStorageImpl::new(context.records_dir())?;
    let log = storage.get_data_for(date).await?;

    println!("{}", date.format("%A %Y-%m-%d"));
    for entry in log.iter() {
        println!(
            "  {} - {}\tactive {}\tafk {}",
            entry.start.with_timezone(&chrono::Local).format("%H:%M:%S"),
            entry.end.with_timezone(&chrono::Local).format("%H:%M:%S"),
            format_clock(entry.active),
            format_clock(entry.afk),
        );
    }

    let totals = DailyTotals::compute(&log);
    let progress = DailyProgress::compute(&log, context.settings.daily_goal_hours);
    println!("Active: {}\tAFK: {}", totals.active, totals.afk);
    println!("{} ({})", progress.summary, progress.percent);
    Ok(())
}

/// Command to process `export` command.
pub async fn process_export_command(context: &AppContext, command: ExportCommand) -> Result<()> {
    let date = parse_day_or_today(command.day.date.as_deref(), command.day.date_style)?;
    let out_dir = match command.out.or_else(|| context.settings.export_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let storage = LogStorageImpl::new(context.records_dir())?;

    match export_day(&storage, date, &out_dir).await? {
        ExportOutcome::Written(path) => println!("Exported to {}", path.display()),
        ExportOutcome::Empty => println!("{EMPTY_EXPORT_MESSAGE}"),
    }
    Ok(())
}
