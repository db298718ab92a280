use std::{
    borrow::Cow,
    io::{self, Write},
};

use ansi_term::Colour;
use anyhow::Result;
use clap::Parser;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::SplitStream;
use tracing::{error, warn};

use crate::tracker::{
    service::{TrackerCommand, TrackerEvent, TrackerSettings},
    start_tracker,
    threshold::{IdleThreshold, ThresholdPolicy},
    view::{SessionSnapshot, SessionView, StatusTag},
};

use super::AppContext;

#[derive(Debug, Parser)]
pub struct TrackCommand {
    #[arg(
        short,
        long,
        help = "Minutes without activity after which time counts as AFK. Defaults to the configured value"
    )]
    threshold: Option<String>,
    #[arg(short, long, help = "Daily goal of active hours. Defaults to the configured value")]
    goal: Option<f64>,
    #[arg(long, value_enum, help = "How out of range thresholds are handled")]
    threshold_policy: Option<ThresholdPolicy>,
    #[arg(long, help = "Don't start a session right away")]
    paused: bool,
}

const HELP: &str = "Enter: activity | s start | stop | t toggle | r reset | e export | threshold <min> | q quit";

/// Translates a line of terminal input. Any line counts as activity, known words also carry a
/// command.
pub fn parse_input(line: &str) -> Vec<TrackerEvent> {
    let mut events = vec![TrackerEvent::Activity];
    let mut words = line.split_whitespace();
    let command = match words.next().map(|w| w.to_ascii_lowercase()).as_deref() {
        Some("s" | "start") => Some(TrackerCommand::Start),
        Some("stop") => Some(TrackerCommand::Stop),
        Some("t" | "toggle") => Some(TrackerCommand::Toggle),
        Some("r" | "reset") => Some(TrackerCommand::Reset),
        Some("e" | "export") => Some(TrackerCommand::Export),
        Some("q" | "quit" | "exit") => Some(TrackerCommand::Quit),
        Some("threshold") => Some(TrackerCommand::SetThreshold(
            words.collect::<Vec<_>>().join(" "),
        )),
        _ => None,
    };
    events.extend(command.map(TrackerEvent::Command));
    events
}

/// Turns input lines into tracker events. Bytes that aren't UTF-8 are replaced rather than
/// rejected, only a failing read ends the input.
pub fn input_events(input: impl AsyncBufRead + Unpin) -> impl Stream<Item = TrackerEvent> {
    SplitStream::new(input.split(b'\n'))
        .take_while(|line| {
            if let Err(e) = line {
                error!("Failed to read input {e:?}");
            }
            futures::future::ready(line.is_ok())
        })
        .flat_map(|line| {
            let line = line.unwrap_or_default();
            let text = String::from_utf8_lossy(&line);
            if matches!(text, Cow::Owned(_)) {
                warn!("Input line is not valid UTF-8, reading it lossily");
            }
            futures::stream::iter(parse_input(&text))
        })
}

/// Draws the tracker on a single, constantly rewritten terminal line.
pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn format(snapshot: &SessionSnapshot) -> String {
        let colour = match snapshot.status.tag {
            StatusTag::Active => Colour::Green,
            StatusTag::AfkDetected => Colour::Red,
            StatusTag::Inactive => Colour::Yellow,
        };
        format!(
            "{} | active {} | afk {} | idle after {} min | {} {} | today {} active, {} afk",
            colour.bold().paint(snapshot.status.text),
            Colour::Green.paint(snapshot.active.as_str()),
            Colour::Red.paint(snapshot.afk.as_str()),
            snapshot.threshold_minutes,
            snapshot.progress.percent,
            snapshot.progress.summary,
            snapshot.totals.active,
            snapshot.totals.afk,
        )
    }
}

impl<W: Write> SessionView for TerminalView<W> {
    fn render(&mut self, snapshot: &SessionSnapshot) {
        let result = write!(self.out, "\r\x1b[2K{}", Self::format(snapshot))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to render {e:?}");
        }
    }

    fn notice(&mut self, message: &str) {
        let result = writeln!(self.out, "\r\x1b[2K{}", Colour::Yellow.bold().paint(message))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to show notice {e:?}");
        }
    }
}

/// Command to process `track` command. Runs an interactive session in the current terminal.
pub async fn process_track_command(
    context: &AppContext,
    TrackCommand {
        threshold,
        goal,
        threshold_policy,
        paused,
    }: TrackCommand,
) -> Result<()> {
    let settings = &context.settings;
    let threshold_policy = threshold_policy.unwrap_or(settings.threshold_policy);
    let threshold = match threshold {
        Some(input) => IdleThreshold::parse_with(&input, threshold_policy)?,
        None => IdleThreshold::from_minutes(settings.idle_threshold_minutes).unwrap_or_else(|| {
            warn!("Configured idle threshold is not positive, using the default");
            IdleThreshold::default()
        }),
    };

    let export_dir = match &settings.export_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    println!("{HELP}");

    let initial = (!paused).then_some(TrackerEvent::Command(TrackerCommand::Start));
    let input = futures::stream::iter(initial)
        .chain(input_events(BufReader::new(tokio::io::stdin())));

    start_tracker(
        context.records_dir(),
        TrackerSettings {
            daily_goal_hours: goal.unwrap_or(settings.daily_goal_hours),
            threshold,
            threshold_policy,
            export_dir,
        },
        Box::new(TerminalView::new(io::stdout())),
        input,
    )
    .await?;

    println!();
    Ok(())
}
