use anyhow::Result;
use ansi_term::Colour;
use chrono::{Duration, Local};
use clap::Parser;

use crate::{
    dashboard::report::{extract_days, ActivityReport},
    storage::log_storage::LogStorageImpl,
    utils::{percentage::Percentage, time::format_hours},
};

use super::{
    dates::{parse_day, DateStyle, DATE_HELP},
    AppContext,
};

const DEFAULT_REPORT_DAYS: i64 = 7;
const BAR_WIDTH: usize = 30;

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(long = "start", short, help = DATE_HELP)]
    start_date: Option<String>,
    #[arg(long = "end", short, help = DATE_HELP)]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, short = 'p', help = "Also print active and AFK hours for every day")]
    per_day: bool,
}

fn bar(share: Percentage) -> String {
    "#".repeat((*share / 100. * BAR_WIDTH as f64).round() as usize)
}

/// Command to process `report` command. Summarizes active vs AFK time over a range of days,
/// by default the last week.
pub async fn process_report_command(
    context: &AppContext,
    ReportCommand {
        start_date,
        end_date,
        date_style,
        per_day,
    }: ReportCommand,
) -> Result<()> {
    let now = Local::now();
    let end = match end_date {
        Some(v) => parse_day(&v, date_style, now)?,
        None => now.date_naive(),
    };
    let start = match start_date {
        Some(v) => parse_day(&v, date_style, now)?,
        None => end - Duration::days(DEFAULT_REPORT_DAYS - 1),
    };

    let storage = LogStorageImpl::new(context.records_dir())?;
    let report = ActivityReport::collect(extract_days(storage, start, end)).await?;

    println!("{start} - {end}");
    println!(
        "{:<20}{:>9}{:>6}  {}",
        "Active (Productive)",
        format_hours(report.totals.active),
        report.active_share().to_string(),
        Colour::Green.paint(bar(report.active_share()))
    );
    println!(
        "{:<20}{:>9}{:>6}  {}",
        "AFK (Wasted)",
        format_hours(report.totals.afk),
        report.afk_share().to_string(),
        Colour::Red.paint(bar(report.afk_share()))
    );

    if per_day {
        let max = report
            .days
            .iter()
            .map(|d| d.totals.total())
            .fold(0., f64::max);
        println!();
        println!("{:<12}{:>8}{:>8}", "Day", "Active", "AFK");
        for day in report.days {
            println!(
                "{:<12}{:>8.2}{:>8.2}  {}{}",
                day.date.format("%Y-%m-%d").to_string(),
                day.totals.active,
                day.totals.afk,
                Colour::Green.paint(bar(Percentage::of_clamped(day.totals.active, max))),
                Colour::Red.paint(bar(Percentage::of_clamped(day.totals.afk, max))),
            );
        }
    }
    Ok(())
}
