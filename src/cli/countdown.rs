use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    dashboard::countdown::{format_remaining, target_moment},
    tracker::shutdown::detect_shutdown,
    utils::clock::{Clock, DefaultClock},
};

use super::{
    dates::{parse_day, DateStyle, DATE_HELP},
    AppContext,
};

#[derive(Debug, Parser)]
pub struct CountdownCommand {
    #[arg(
        long,
        help = format!("Target day. Defaults to \"target_date\" of the configuration. {DATE_HELP}")
    )]
    to: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Show only the total amount of hours left")]
    hours: bool,
    #[arg(short, long, help = "Keep updating every second until interrupted")]
    watch: bool,
}

/// Command to process `countdown` command.
pub async fn process_countdown_command(
    context: &AppContext,
    CountdownCommand {
        to,
        date_style,
        hours,
        watch,
    }: CountdownCommand,
) -> Result<()> {
    let target = match to {
        Some(v) => parse_day(&v, date_style, Local::now())?,
        None => context.settings.target_date.ok_or_else(|| {
            anyhow!("No target date. Pass --to or set \"target_date\" in the configuration")
        })?,
    };
    let moment = target_moment(target)?;
    let clock = DefaultClock;

    if !watch {
        println!(
            "{}",
            format_remaining(moment.signed_duration_since(clock.time()), hours)
        );
        return Ok(());
    }

    select! {
        result = redraw(clock, moment, hours) => result,
        _ = detect_shutdown(CancellationToken::new()) => {
            println!();
            Ok(())
        },
    }
}

async fn redraw(clock: impl Clock, moment: DateTime<Local>, hours: bool) -> Result<()> {
    let mut out = io::stdout();
    loop {
        let remaining = format_remaining(moment.signed_duration_since(clock.time()), hours);
        write!(out, "\r\x1b[2K{remaining}")?;
        out.flush()?;
        clock.sleep(Duration::from_secs(1)).await;
    }
}
