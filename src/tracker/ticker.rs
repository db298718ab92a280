use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::utils::clock::Clock;

use super::service::TrackerEvent;

struct ScheduledTick {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the periodic tick of a session. At most one tick task exists at a time: scheduling a new
/// one always cancels the previous task first.
///
/// Every scheduled task gets a new generation number which is attached to its ticks, so ticks
/// that were already queued by a cancelled task can be recognized and dropped.
pub struct Ticker {
    sender: mpsc::Sender<TrackerEvent>,
    clock: Arc<dyn Clock>,
    period: Duration,
    generation: u64,
    current: Option<ScheduledTick>,
}

impl Ticker {
    pub fn new(sender: mpsc::Sender<TrackerEvent>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            sender,
            clock,
            period,
            generation: 0,
            current: None,
        }
    }

    /// Starts ticking every `period`, the first tick comes one period from now.
    pub fn schedule(&mut self) {
        self.cancel();
        self.generation += 1;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(tick_loop(
            self.sender.clone(),
            self.clock.clone(),
            self.period,
            self.generation,
            cancel.clone(),
        ));
        debug!("Scheduled tick generation {}", self.generation);
        self.current = Some(ScheduledTick { cancel, task });
    }

    /// Stops ticking. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(scheduled) = self.current.take() {
            scheduled.cancel.cancel();
            scheduled.task.abort();
            debug!("Cancelled tick generation {}", self.generation);
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.current.is_some()
    }

    /// Whether a tick belongs to the currently scheduled task.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_scheduled() && generation == self.generation
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn tick_loop(
    sender: mpsc::Sender<TrackerEvent>,
    clock: Arc<dyn Clock>,
    period: Duration,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut tick_point = clock.instant();
    loop {
        tick_point += period;

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = clock.sleep_until(tick_point) => ()
        }

        trace!("Tick {generation}");
        if sender.send(TrackerEvent::Tick(generation)).await.is_err() {
            // Receiver is gone, nobody is interested in ticks anymore.
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    use super::Ticker;
    use crate::{tracker::service::TrackerEvent, utils::clock::TestClock};

    fn ticker(sender: mpsc::Sender<TrackerEvent>) -> Ticker {
        let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2018, 7, 4, 0, 0, 0).unwrap());
        Ticker::new(sender, Arc::new(clock), Duration::from_secs(1))
    }

    fn drain(receiver: &mut mpsc::Receiver<TrackerEvent>) -> Vec<u64> {
        let mut ticks = vec![];
        while let Ok(event) = receiver.try_recv() {
            if let TrackerEvent::Tick(generation) = event {
                ticks.push(generation);
            }
        }
        ticks
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (sender, mut receiver) = mpsc::channel(16);
        let mut ticker = ticker(sender);
        ticker.schedule();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(drain(&mut receiver), vec![1, 1, 1]);
        assert!(ticker.is_current(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_previous_task() {
        let (sender, mut receiver) = mpsc::channel(16);
        let mut ticker = ticker(sender);
        ticker.schedule();
        ticker.schedule();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(drain(&mut receiver), vec![2, 2]);
        assert!(!ticker.is_current(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (sender, mut receiver) = mpsc::channel(16);
        let mut ticker = ticker(sender);
        ticker.schedule();
        ticker.cancel();
        ticker.cancel();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(drain(&mut receiver).is_empty());
        assert!(!ticker.is_scheduled());
        assert!(!ticker.is_current(1));
    }
}
