use tokio::select;
use tokio_util::sync::CancellationToken;

/// Resolves once the process is asked to stop, either by ctrl-c or, on unix,
/// by the termination signal `focusduck stop` sends. Cancellation gives the
/// coordinator a chance to flush the duration ledger.
///
/// On Windows detached processes can't detect signals sent to them, so this
/// should be enhanced in the future to support another way of stopping.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = terminate_signal() => {
            cancelation.cancel();
        },
    };
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            terminate.recv().await;
        }
        Err(_) => std::future::pending::<()>().await,
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await
}
