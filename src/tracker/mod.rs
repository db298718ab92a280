//! Session tracking. [session::SessionTracker] is the active/AFK state machine,
//! [service::SessionService] drives it from user events and periodic ticks and persists finished
//! sessions into the daily log.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use futures::{Stream, StreamExt};
use service::{SessionService, TrackerEvent, TrackerSettings};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use view::SessionView;

use crate::{storage::log_storage::LogStorageImpl, utils::clock::DefaultClock};

pub mod export;
pub mod progress;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod threshold;
pub mod ticker;
pub mod view;

/// Represents the starting point for an interactive tracking session. Runs until the input ends,
/// the user quits, or Ctrl-C is pressed.
pub async fn start_tracker(
    record_dir: PathBuf,
    settings: TrackerSettings,
    view: Box<dyn SessionView>,
    input: impl Stream<Item = TrackerEvent>,
) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<TrackerEvent>(32);
    let shutdown_token = CancellationToken::new();

    let storage = LogStorageImpl::new(record_dir)?;
    let service = SessionService::new(
        (sender.clone(), receiver),
        storage,
        view,
        Arc::new(DefaultClock),
        shutdown_token.clone(),
        settings,
    );

    let (_, service_result, _) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = service.run().await;
            shutdown_token.cancel();
            result
        },
        forward_input(input, sender, &shutdown_token),
    );

    if let Err(e) = &service_result {
        error!("Tracker stopped with an error {e:?}");
    }
    service_result
}

/// Pushes input events into the service until the input ends or the tracker shuts down.
async fn forward_input(
    input: impl Stream<Item = TrackerEvent>,
    sender: mpsc::Sender<TrackerEvent>,
    shutdown: &CancellationToken,
) {
    let mut input = std::pin::pin!(input);
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return,
            event = input.next() => event,
        };
        let Some(event) = event else {
            debug!("Input ended");
            // Let the service finish whatever is queued and save the session.
            let _ = sender.send(TrackerEvent::Command(service::TrackerCommand::Quit)).await;
            return;
        };
        if sender.send(event).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tracker_tests {
    use std::time::Duration;

    use anyhow::Result;
    use futures::{stream, StreamExt};
    use tempfile::tempdir;

    use super::{
        service::{TrackerCommand, TrackerEvent, TrackerSettings},
        start_tracker,
        threshold::{IdleThreshold, ThresholdPolicy},
        view::MockSessionView,
    };
    use crate::{
        storage::log_storage::{LogStorage, LogStorageImpl},
        utils::{
            clock::{Clock, DefaultClock},
            logging::TEST_LOGGING,
        },
    };

    /// Drives the whole tracker through an input stream and checks the session lands on disk.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_tracker() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let mut view = MockSessionView::new();
        view.expect_render().returning(|_| ());

        let input = stream::iter([TrackerEvent::Command(TrackerCommand::Start)]).chain(
            stream::once(async {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                TrackerEvent::Command(TrackerCommand::Stop)
            }),
        );

        start_tracker(
            dir.path().join("records"),
            TrackerSettings {
                daily_goal_hours: 8.,
                threshold: IdleThreshold::default(),
                threshold_policy: ThresholdPolicy::Reject,
                export_dir: dir.path().to_path_buf(),
            },
            Box::new(view),
            input,
        )
        .await?;

        let storage = LogStorageImpl::new(dir.path().join("records"))?;
        let log = storage.get_data_for(DefaultClock.today()).await?;
        assert_eq!(log.len(), 1);
        assert_eq!((log[0].active * 3600.).round() as i64, 2);
        Ok(())
    }
}
