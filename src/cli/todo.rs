use anyhow::Result;
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};

use crate::{
    dashboard::todo::{render_grid, Slot, TodoBoard},
    storage::document::JsonDocument,
};

use super::{
    dates::{parse_day, DateStyle, DATE_HELP},
    AppContext,
};

pub const TODO_FILE_NAME: &str = "todo.json";

const DEFAULT_TODO_DAYS: i64 = 7;

#[derive(Debug, Subcommand)]
pub enum TodoCommand {
    #[command(about = "Print the task grid of a range of days. By default the coming week")]
    Show(ShowTodo),
    #[command(about = "Set the text of a task slot")]
    Set(SetTask),
    #[command(about = "Check or uncheck a task slot")]
    Check(CheckTask),
}

#[derive(Debug, Parser)]
pub struct ShowTodo {
    #[arg(long = "start", short, help = DATE_HELP)]
    start_date: Option<String>,
    #[arg(long = "end", short, help = DATE_HELP)]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct SlotArgs {
    #[arg(help = DATE_HELP)]
    date: String,
    #[arg(help = "Section label, case-insensitive")]
    section: String,
    #[arg(help = "Task column, starting from 1")]
    column: u8,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Debug, Parser)]
pub struct SetTask {
    #[command(flatten)]
    slot: SlotArgs,
    #[arg(help = "Task text. Empty clears the task")]
    text: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct CheckTask {
    #[command(flatten)]
    slot: SlotArgs,
    #[arg(long, help = "Uncheck instead")]
    off: bool,
}

fn todo_document(context: &AppContext) -> JsonDocument<TodoBoard> {
    JsonDocument::new(context.app_dir.join(TODO_FILE_NAME))
}

/// Command to process `todo` subcommands.
pub async fn process_todo_command(context: &AppContext, command: TodoCommand) -> Result<()> {
    let document = todo_document(context);
    let mut board = document.load().await;
    let sections = &context.settings.section_labels;
    let now = Local::now();

    match command {
        TodoCommand::Show(ShowTodo {
            start_date,
            end_date,
            date_style,
        }) => {
            let start = match start_date {
                Some(v) => parse_day(&v, date_style, now)?,
                None => now.date_naive(),
            };
            let end = match end_date {
                Some(v) => parse_day(&v, date_style, now)?,
                None => start + Duration::days(DEFAULT_TODO_DAYS - 1),
            };
            print!("{}", render_grid(&board, sections, start, end));
        }
        TodoCommand::Set(SetTask { slot, text }) => {
            let date = parse_day(&slot.date, slot.date_style, now)?;
            let resolved = Slot::resolve(sections, &slot.section, slot.column)?;
            board.set_task(date, &resolved, text.join(" "));
            document.save(&board).await?;
        }
        TodoCommand::Check(CheckTask { slot, off }) => {
            let date = parse_day(&slot.date, slot.date_style, now)?;
            let resolved = Slot::resolve(sections, &slot.section, slot.column)?;
            board.set_checked(date, &resolved, !off);
            document.save(&board).await?;
        }
    }
    Ok(())
}
