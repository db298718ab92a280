use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::{
    dashboard::calendar::{render_month, CalendarMarks, YearMonth},
    storage::document::JsonDocument,
};

use super::{
    dates::{parse_day, DateStyle, DATE_HELP},
    AppContext,
};

pub const CALENDAR_FILE_NAME: &str = "calendar.json";

const SUMMARY_WINDOWS: [u32; 3] = [7, 15, 30];

#[derive(Debug, Subcommand)]
pub enum CalendarCommand {
    #[command(about = "Print a month with marked days and productive day summaries")]
    Show(ShowCalendar),
    #[command(about = "Cycle a day through productive, wasted and unmarked")]
    Mark(MarkDay),
}

#[derive(Debug, Parser)]
pub struct ShowCalendar {
    #[arg(long, short, help = "Month as YYYY-MM. Defaults to the current month")]
    month: Option<YearMonth>,
    #[arg(
        long,
        short,
        allow_negative_numbers = true,
        default_value_t = 0,
        help = "Months to move from the shown month, e.g. -1 for the previous one"
    )]
    shift: i32,
}

#[derive(Debug, Parser)]
pub struct MarkDay {
    #[arg(help = DATE_HELP)]
    date: String,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

fn calendar_document(context: &AppContext) -> JsonDocument<CalendarMarks> {
    JsonDocument::new(context.app_dir.join(CALENDAR_FILE_NAME))
}

/// Command to process `calendar` subcommands.
pub async fn process_calendar_command(context: &AppContext, command: CalendarCommand) -> Result<()> {
    let document = calendar_document(context);
    let mut marks = document.load().await;
    let today = Local::now().date_naive();

    match command {
        CalendarCommand::Show(ShowCalendar { month, shift }) => {
            let month = month.unwrap_or(YearMonth::of(today)).shift(shift)?;
            print!("{}", render_month(month, &marks));
            println!();
            for days in SUMMARY_WINDOWS {
                println!(
                    "Last {days} days: {} productive",
                    marks.productive_share(today, days)
                );
            }
        }
        CalendarCommand::Mark(MarkDay { date, date_style }) => {
            let date = parse_day(&date, date_style, Local::now())?;
            let mark = marks.toggle(date);
            document.save(&marks).await?;
            match mark {
                Some(mark) => println!("{date} marked as {}", mark.label()),
                None => println!("{date} unmarked"),
            }
        }
    }
    Ok(())
}
