pub mod calendar;
pub mod countdown;
pub mod dates;
pub mod report;
pub mod stats;
pub mod todo;
pub mod track;

use std::path::PathBuf;

use anyhow::Result;
use calendar::{process_calendar_command, CalendarCommand};
use clap::{Parser, Subcommand};
use countdown::{process_countdown_command, CountdownCommand};
use report::{process_report_command, ReportCommand};
use stats::{process_export_command, process_stats_command, DayCommand, ExportCommand};
use todo::{process_todo_command, TodoCommand};
use track::{process_track_command, TrackCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    config::{settings_document, Settings},
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "focuslog", version, long_about = None)]
#[command(about = "Terminal dashboard for focus sessions, AFK time and daily goals", long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print trace logs to stderr")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/focuslog or $HOME/.local/state/focuslog"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Track a focus session. Every line typed counts as activity")]
    Track {
        #[command(flatten)]
        command: TrackCommand,
    },
    #[command(about = "Show committed active and AFK time of a day with goal progress")]
    Stats {
        #[command(flatten)]
        command: DayCommand,
    },
    #[command(about = "Export sessions of a day as CSV")]
    Export {
        #[command(flatten)]
        command: ExportCommand,
    },
    #[command(about = "Active vs AFK time over a range of days")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Time left until the target date")]
    Countdown {
        #[command(flatten)]
        command: CountdownCommand,
    },
    #[command(about = "Month calendar of productive and wasted days")]
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    #[command(about = "Per-day task grid")]
    Todo {
        #[command(subcommand)]
        command: TodoCommand,
    },
    #[command(about = "Show the effective configuration")]
    Config {
        #[arg(long, help = "Write the effective configuration into config.json")]
        init: bool,
    },
}

/// Shared state every command gets: where data lives and what the user configured.
pub struct AppContext {
    pub app_dir: PathBuf,
    pub settings: Settings,
}

impl AppContext {
    pub fn records_dir(&self) -> PathBuf {
        self.app_dir.join("records")
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    let settings = settings_document(&app_dir).load().await;
    debug!("Loaded settings {settings:?}");
    let context = AppContext { app_dir, settings };

    match args.commands {
        Commands::Track { command } => process_track_command(&context, command).await,
        Commands::Stats { command } => process_stats_command(&context, command).await,
        Commands::Export { command } => process_export_command(&context, command).await,
        Commands::Report { command } => process_report_command(&context, command).await,
        Commands::Countdown { command } => process_countdown_command(&context, command).await,
        Commands::Calendar { command } => process_calendar_command(&context, command).await,
        Commands::Todo { command } => process_todo_command(&context, command).await,
        Commands::Config { init } => {
            if init {
                settings_document(&context.app_dir)
                    .save(&context.settings)
                    .await?;
                println!("Written {:?}", context.app_dir.join(crate::config::CONFIG_FILE_NAME));
            }
            println!("{}", serde_json::to_string_pretty(&context.settings)?);
            Ok(())
        }
    }
}
