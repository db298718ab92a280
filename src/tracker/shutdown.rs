use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects Ctrl-C and turns it into a cancellation. Returns early when the application is already
/// shutting down for another reason.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
