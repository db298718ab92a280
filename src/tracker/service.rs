use std::{ops::ControlFlow, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    storage::{entities::SessionLogEntry, log_storage::LogStorage},
    utils::clock::Clock,
};

use super::{
    export::{export_day, ExportOutcome, EMPTY_EXPORT_MESSAGE},
    progress::{DailyProgress, DailyTotals},
    session::{SessionTracker, TickOutcome, TICK_MS},
    threshold::{IdleThreshold, ThresholdPolicy},
    ticker::Ticker,
    view::{SessionSnapshot, SessionView, Status, StatusTag},
};

/// Discrete user actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCommand {
    Start,
    Stop,
    /// Start when idle, stop when running.
    Toggle,
    Reset,
    Export,
    /// Raw user input in minutes, validated according to [ThresholdPolicy].
    SetThreshold(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Command(TrackerCommand),
    /// Pointer motion, key press or click.
    Activity,
    /// Periodic tick, tagged with the generation of the task that produced it.
    Tick(u64),
}

pub struct TrackerSettings {
    pub daily_goal_hours: f64,
    pub threshold: IdleThreshold,
    pub threshold_policy: ThresholdPolicy,
    pub export_dir: PathBuf,
}

/// Event loop around a [SessionTracker]. Commands, activity and ticks all arrive through one
/// channel and every event is handled to completion before the next one is read.
pub struct SessionService<S: LogStorage> {
    receiver: mpsc::Receiver<TrackerEvent>,
    tracker: SessionTracker,
    ticker: Ticker,
    storage: S,
    view: Box<dyn SessionView>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    daily_goal_hours: f64,
    threshold_policy: ThresholdPolicy,
    export_dir: PathBuf,
    status: Status,
}

impl<S: LogStorage> SessionService<S> {
    pub fn new(
        (sender, receiver): (mpsc::Sender<TrackerEvent>, mpsc::Receiver<TrackerEvent>),
        storage: S,
        view: Box<dyn SessionView>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            receiver,
            tracker: SessionTracker::new(settings.threshold),
            ticker: Ticker::new(sender, clock.clone(), Duration::from_millis(TICK_MS)),
            storage,
            view,
            clock,
            shutdown,
            daily_goal_hours: settings.daily_goal_hours,
            threshold_policy: settings.threshold_policy,
            export_dir: settings.export_dir,
            status: Status::INACTIVE,
        }
    }

    /// Executes the tracker event loop until a quit command, shutdown, or until every sender is
    /// gone. A session that is still running at that point is saved.
    pub async fn run(mut self) -> Result<()> {
        self.render().await;
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                event = self.receiver.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if self.handle(event).await.is_break() {
                break;
            }
        }

        self.finish().await;
        Ok(())
    }

    async fn handle(&mut self, event: TrackerEvent) -> ControlFlow<()> {
        match event {
            TrackerEvent::Tick(generation) => self.on_tick(generation).await,
            TrackerEvent::Activity => self.on_activity().await,
            TrackerEvent::Command(command) => {
                debug!("Handling command {command:?}");
                match command {
                    TrackerCommand::Start => self.start().await,
                    TrackerCommand::Stop => self.stop().await,
                    TrackerCommand::Toggle if self.tracker.is_running() => self.stop().await,
                    TrackerCommand::Toggle => self.start().await,
                    TrackerCommand::Reset => self.reset().await,
                    TrackerCommand::Export => self.export().await,
                    TrackerCommand::SetThreshold(input) => self.set_threshold(&input).await,
                    TrackerCommand::Quit => return ControlFlow::Break(()),
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn start(&mut self) {
        // Only one tick task may exist, the old one goes away before anything else happens.
        self.ticker.cancel();
        let previous = self.tracker.start(self.clock.time());
        self.commit(previous).await;
        self.ticker.schedule();
        self.status = Status::STARTED;
        self.render().await;
    }

    async fn stop(&mut self) {
        self.ticker.cancel();
        if !self.tracker.is_running() {
            trace!("Stop requested while idle");
            return;
        }
        let entry = self.tracker.stop(self.clock.time());
        self.commit(entry).await;
        self.status = Status::ENDED;
        self.render().await;
    }

    async fn reset(&mut self) {
        self.ticker.cancel();
        let entry = self.tracker.reset(self.clock.time());
        self.commit(entry).await;
        self.status = Status::INACTIVE;
        self.render().await;
    }

    async fn on_activity(&mut self) {
        if !self.tracker.is_running() {
            return;
        }
        self.tracker.record_activity(self.clock.time());
        if self.status != Status::ACTIVE {
            self.status = Status::ACTIVE;
            self.render().await;
        }
    }

    async fn on_tick(&mut self, generation: u64) {
        if !self.ticker.is_current(generation) {
            trace!("Dropping stale tick of generation {generation}");
            return;
        }

        match self.tracker.tick(self.clock.time()) {
            Some(TickOutcome::Afk { alert_minutes }) => {
                self.status = Status::AFK;
                if let Some(minutes) = alert_minutes {
                    info!("AFK for {minutes} minutes");
                    self.view.notice(&format!("AFK for {minutes} mins!"));
                }
            }
            Some(TickOutcome::Active) => {
                if self.status.tag == StatusTag::AfkDetected {
                    self.status = Status::ACTIVE;
                }
            }
            None => return,
        }
        self.render().await;
    }

    async fn export(&mut self) {
        let today = self.clock.today();
        match export_day(&self.storage, today, &self.export_dir).await {
            Ok(ExportOutcome::Written(path)) => {
                self.view.notice(&format!("Exported to {}", path.display()))
            }
            Ok(ExportOutcome::Empty) => self.view.notice(EMPTY_EXPORT_MESSAGE),
            Err(e) => {
                error!("Export failed {e:?}");
                self.view.notice(&format!("Export failed: {e}"));
            }
        }
    }

    async fn set_threshold(&mut self, input: &str) {
        match IdleThreshold::parse_with(input, self.threshold_policy) {
            Ok(threshold) => {
                self.tracker.set_idle_threshold(threshold);
                self.render().await;
            }
            Err(e) => {
                warn!("Rejected idle threshold {input:?}: {e}");
                self.view.notice(&e.to_string());
            }
        }
    }

    /// Appends a finished session to the log of the day the session ended on.
    async fn commit(&mut self, entry: Option<SessionLogEntry>) {
        let Some(entry) = entry else {
            return;
        };
        let today = self.clock.today();
        match self.storage.append(today, entry).await {
            Ok(()) => info!("Saved session into log of {today}"),
            Err(e) => {
                error!("Failed to save session {e:?}");
                self.view.notice(&format!("Failed to save session: {e}"));
            }
        }
    }

    async fn render(&mut self) {
        let today = self.clock.today();
        let log = self.storage.get_data_for(today).await.unwrap_or_else(|e| {
            warn!("Failed to read log of {today}, treating it as empty: {e}");
            vec![]
        });

        let snapshot = SessionSnapshot {
            running: self.tracker.is_running(),
            active: self.tracker.active_clock(),
            afk: self.tracker.afk_clock(),
            status: self.status.clone(),
            threshold_minutes: self.tracker.threshold().minutes(),
            progress: DailyProgress::compute(&log, self.daily_goal_hours),
            totals: DailyTotals::compute(&log),
        };
        self.view.render(&snapshot);
    }

    async fn finish(&mut self) {
        self.ticker.cancel();
        if self.tracker.is_running() {
            let entry = self.tracker.stop(self.clock.time());
            self.commit(entry).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::{SessionService, TrackerCommand, TrackerEvent, TrackerSettings};
    use crate::{
        storage::{entities::SessionLogEntry, log_storage::memory::MemoryLogStorage},
        tracker::{
            threshold::{IdleThreshold, ThresholdPolicy},
            view::{MockSessionView, StatusTag},
        },
        utils::{clock::TestClock, logging::TEST_LOGGING},
    };

    const TEST_DAY: NaiveDate = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();

    struct Harness {
        sender: mpsc::Sender<TrackerEvent>,
        storage: Arc<MemoryLogStorage>,
        service: SessionService<Arc<MemoryLogStorage>>,
    }

    fn harness(view: MockSessionView, threshold_minutes: u32) -> Harness {
        harness_at(
            view,
            threshold_minutes,
            Utc.with_ymd_and_hms(2018, 7, 4, 9, 0, 0).unwrap(),
        )
    }

    fn harness_at(
        view: MockSessionView,
        threshold_minutes: u32,
        start_time: DateTime<Utc>,
    ) -> Harness {
        *TEST_LOGGING;
        let (sender, receiver) = mpsc::channel(32);
        let storage = Arc::new(MemoryLogStorage::default());
        let clock = TestClock::starting_at(start_time);
        let service = SessionService::new(
            (sender.clone(), receiver),
            storage.clone(),
            Box::new(view),
            Arc::new(clock),
            CancellationToken::new(),
            TrackerSettings {
                daily_goal_hours: 8.,
                threshold: IdleThreshold::from_minutes(threshold_minutes).unwrap(),
                threshold_policy: ThresholdPolicy::Reject,
                export_dir: std::env::temp_dir(),
            },
        );
        Harness {
            sender,
            storage,
            service,
        }
    }

    fn quiet_view() -> MockSessionView {
        let mut view = MockSessionView::new();
        view.expect_render().returning(|_| ());
        view
    }

    async fn command(sender: &mpsc::Sender<TrackerEvent>, command: TrackerCommand) {
        sender.send(TrackerEvent::Command(command)).await.unwrap();
    }

    fn seconds(hours: f64) -> i64 {
        (hours * 3600.).round() as i64
    }

    fn single_entry(storage: &MemoryLogStorage) -> SessionLogEntry {
        let log = storage.log(TEST_DAY);
        assert_eq!(log.len(), 1, "Expected exactly one session, got {log:?}");
        log.into_iter().next().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_is_logged_on_stop() -> Result<()> {
        let Harness {
            sender,
            storage,
            service,
        } = harness(quiet_view(), 5);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(5500)).await;
            command(&sender, TrackerCommand::Stop).await;
            command(&sender, TrackerCommand::Stop).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        let entry = single_entry(&storage);
        assert_eq!(seconds(entry.active), 5);
        assert_eq!(entry.afk, 0.);
        assert_eq!((entry.end - entry.start).num_milliseconds(), 5500);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_is_logged_under_stop_day() -> Result<()> {
        let Harness {
            sender,
            storage,
            service,
        } = harness_at(
            quiet_view(),
            5,
            Utc.with_ymd_and_hms(2018, 7, 4, 23, 59, 58).unwrap(),
        );

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(3500)).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        assert!(storage.log(TEST_DAY).is_empty());
        let next_day = storage.log(TEST_DAY.succ_opt().unwrap());
        assert_eq!(next_day.len(), 1);
        assert_eq!(next_day[0].start.date_naive(), TEST_DAY);
        assert_eq!(seconds(next_day[0].active), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_ticker() -> Result<()> {
        let Harness {
            sender,
            storage,
            service,
        } = harness(quiet_view(), 5);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(3500)).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        // The first session had no ticks, the running one is saved on quit.
        assert_eq!(seconds(single_entry(&storage).active), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_afk_alert_is_raised_once() -> Result<()> {
        let mut view = quiet_view();
        view.expect_notice()
            .withf(|message| message == "AFK for 1 mins!")
            .times(1)
            .returning(|_| ());
        let Harness {
            sender,
            storage,
            service,
        } = harness(view, 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(125_500)).await;
            command(&sender, TrackerCommand::Toggle).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        let entry = single_entry(&storage);
        assert_eq!(seconds(entry.active), 60);
        assert_eq!(seconds(entry.afk), 65);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_active() -> Result<()> {
        let Harness {
            sender,
            storage,
            service,
        } = harness(quiet_view(), 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(50_500)).await;
            sender.send(TrackerEvent::Activity).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50_000)).await;
            sender.send(TrackerEvent::Activity).await.unwrap();
            tokio::time::sleep(Duration::from_millis(30_000)).await;
            command(&sender, TrackerCommand::Stop).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        let entry = single_entry(&storage);
        assert_eq!(seconds(entry.active), 130);
        assert_eq!(entry.afk, 0.);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_is_ignored() -> Result<()> {
        let Harness {
            sender,
            storage,
            service,
        } = harness(quiet_view(), 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            sender.send(TrackerEvent::Tick(99)).await.unwrap();
            command(&sender, TrackerCommand::Reset).await;
            sender.send(TrackerEvent::Tick(1)).await.unwrap();
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        assert!(storage.log(TEST_DAY).is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_threshold_is_rejected() -> Result<()> {
        let mut view = quiet_view();
        view.expect_notice()
            .withf(|message| message.contains("whole number of minutes"))
            .times(1)
            .returning(|_| ());
        let Harness {
            sender, service, ..
        } = harness(view, 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::SetThreshold("abc".into())).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_of_empty_day_notifies() -> Result<()> {
        let mut view = quiet_view();
        view.expect_notice()
            .withf(|message| message == "No logs!")
            .times(1)
            .returning(|_| ());
        let Harness {
            sender, service, ..
        } = harness(view, 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Export).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reports_afk_status_and_progress() -> Result<()> {
        let mut view = MockSessionView::new();
        view.expect_notice().returning(|_| ());
        let snapshots = Arc::new(std::sync::Mutex::new(vec![]));
        let collected = snapshots.clone();
        view.expect_render()
            .returning(move |snapshot| collected.lock().unwrap().push(snapshot.clone()));
        let Harness {
            sender, service, ..
        } = harness(view, 1);

        let (result, _) = tokio::join!(service.run(), async {
            command(&sender, TrackerCommand::Start).await;
            tokio::time::sleep(Duration::from_millis(61_500)).await;
            command(&sender, TrackerCommand::Stop).await;
            command(&sender, TrackerCommand::Quit).await;
        });
        result?;

        let snapshots = snapshots.lock().unwrap();
        let afk = snapshots
            .iter()
            .find(|s| s.status.tag == StatusTag::AfkDetected)
            .expect("AFK snapshot");
        assert!(afk.running);
        assert_eq!(afk.afk, "00:00:01");
        assert_eq!(afk.active, "00:01:00");

        let last = snapshots.last().unwrap();
        assert!(!last.running);
        assert_eq!(last.status.text, "Session ended");
        assert_eq!(last.totals.active, "0h 1m");
        assert_eq!(last.progress.summary, "0h 1m / 8 hours active today");
        Ok(())
    }
}
