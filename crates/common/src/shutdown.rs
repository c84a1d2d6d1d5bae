//! Cooperative shutdown signalling over a `watch` channel.

use tokio::sync::watch;

/// Resolve once the shutdown flag on `rx` becomes `true`.
///
/// Resolves immediately if the flag is already set, and also when the sender
/// side is dropped (an orphaned task has nothing left to serve). Intended for
/// use as the high-priority branch of a `tokio::select!`.
pub async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
