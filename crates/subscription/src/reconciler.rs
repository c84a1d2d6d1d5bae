//! Set-diff reconciliation of listener tasks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Starts one listener task for an instrument. The task must exit promptly
/// once the cancellation flag on `cancel_rx` turns true.
pub trait ListenerSpawner: Send + Sync {
    fn spawn(&self, symbol: &str, cancel_rx: watch::Receiver<bool>) -> JoinHandle<()>;
}

/// One running listener: its cancellation signal and its task.
struct ListenerHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Sole owner of the active-listener map. Reconciliation runs are serialized
/// by `&mut self`; the subscription loop is the only caller.
pub struct SubscriptionReconciler {
    spawner: Arc<dyn ListenerSpawner>,
    active: HashMap<String, ListenerHandle>,
}

impl SubscriptionReconciler {
    pub fn new(spawner: Arc<dyn ListenerSpawner>) -> Self {
        Self {
            spawner,
            active: HashMap::new(),
        }
    }

    /// Symbols with a live listener handle.
    pub fn active_symbols(&self) -> HashSet<String> {
        self.active.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Bring the listener set to exactly `desired`.
    ///
    /// Stale listeners are signalled and their join handles drained on a
    /// detached task, so teardown never blocks the refresh tick; each
    /// listener closes its own connection on the way out. New symbols get a
    /// fresh listener each; a symbol already active is left untouched, so
    /// no instrument ever holds two handles.
    pub fn reconcile(&mut self, desired: &HashSet<String>) {
        let to_stop: Vec<String> = self
            .active
            .keys()
            .filter(|symbol| !desired.contains(*symbol))
            .cloned()
            .collect();

        let mut draining = Vec::with_capacity(to_stop.len());
        for symbol in to_stop {
            if let Some(handle) = self.active.remove(&symbol) {
                let _ = handle.cancel_tx.send(true);
                draining.push(handle.task);
                debug!(symbol = %symbol, "listener cancelled, left the universe");
            }
        }
        if !draining.is_empty() {
            let stopped = draining.len();
            tokio::spawn(async move {
                let _ = futures_util::future::join_all(draining).await;
                debug!(count = stopped, "stale listeners drained");
            });
        }

        let mut started = 0usize;
        for symbol in desired {
            if self.active.contains_key(symbol) {
                continue;
            }
            let (cancel_tx, cancel_rx) = watch::channel(false);
            let task = self.spawner.spawn(symbol, cancel_rx);
            self.active
                .insert(symbol.clone(), ListenerHandle { cancel_tx, task });
            started += 1;
        }

        info!(
            active = self.active.len(),
            started, "subscriptions reconciled"
        );
    }

    /// Cancel every listener and wait for all of them to release their
    /// resources.
    pub async fn shutdown(&mut self) {
        let handles: Vec<ListenerHandle> = self.active.drain().map(|(_, h)| h).collect();
        for handle in &handles {
            let _ = handle.cancel_tx.send(true);
        }

        let count = handles.len();
        let _ = futures_util::future::join_all(handles.into_iter().map(|h| h.task)).await;
        info!(count, "all listeners stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Spawns tasks that just wait for cancellation, recording lifecycle.
    struct StubSpawner {
        started: Mutex<Vec<String>>,
        running: Arc<AtomicUsize>,
    }

    impl StubSpawner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Mutex::new(Vec::new()),
                running: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn started(&self) -> Vec<String> {
            let mut list = self.started.lock().clone();
            list.sort();
            list
        }

        fn running(&self) -> usize {
            self.running.load(Ordering::SeqCst)
        }
    }

    impl ListenerSpawner for StubSpawner {
        fn spawn(&self, symbol: &str, mut cancel_rx: watch::Receiver<bool>) -> JoinHandle<()> {
            self.started.lock().push(symbol.to_string());
            self.running.fetch_add(1, Ordering::SeqCst);
            let running = self.running.clone();
            tokio::spawn(async move {
                common::cancelled(&mut cancel_rx).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
        }
    }

    fn symbols(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn first_reconcile_starts_everything() {
        let spawner = StubSpawner::new();
        let mut reconciler = SubscriptionReconciler::new(spawner.clone());

        reconciler.reconcile(&symbols(&["AAAUSDT", "BBBUSDT"]));

        assert_eq!(reconciler.active_symbols(), symbols(&["AAAUSDT", "BBBUSDT"]));
        assert_eq!(spawner.started(), vec!["AAAUSDT", "BBBUSDT"]);
    }

    #[tokio::test]
    async fn reconcile_applies_the_symmetric_difference() {
        let spawner = StubSpawner::new();
        let mut reconciler = SubscriptionReconciler::new(spawner.clone());

        reconciler.reconcile(&symbols(&["AAAUSDT", "BBBUSDT"]));
        reconciler.reconcile(&symbols(&["BBBUSDT", "CCCUSDT"]));

        assert_eq!(reconciler.active_symbols(), symbols(&["BBBUSDT", "CCCUSDT"]));
        // BBBUSDT survived both rounds: spawned exactly once.
        assert_eq!(spawner.started(), vec!["AAAUSDT", "BBBUSDT", "CCCUSDT"]);

        // The cancelled task actually wound down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(spawner.running(), 2);
    }

    #[tokio::test]
    async fn identical_universe_spawns_nothing_new() {
        let spawner = StubSpawner::new();
        let mut reconciler = SubscriptionReconciler::new(spawner.clone());

        let universe = symbols(&["AAAUSDT", "BBBUSDT"]);
        reconciler.reconcile(&universe);
        reconciler.reconcile(&universe);
        reconciler.reconcile(&universe);

        assert_eq!(spawner.started().len(), 2);
        assert_eq!(reconciler.len(), 2);
    }

    #[tokio::test]
    async fn empty_universe_stops_everything() {
        let spawner = StubSpawner::new();
        let mut reconciler = SubscriptionReconciler::new(spawner.clone());

        reconciler.reconcile(&symbols(&["AAAUSDT", "BBBUSDT"]));
        reconciler.reconcile(&HashSet::new());

        assert!(reconciler.is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(spawner.running(), 0);
    }

    #[tokio::test]
    async fn shutdown_cancels_and_joins_all() {
        let spawner = StubSpawner::new();
        let mut reconciler = SubscriptionReconciler::new(spawner.clone());

        reconciler.reconcile(&symbols(&["AAAUSDT", "BBBUSDT", "CCCUSDT"]));
        reconciler.shutdown().await;

        assert!(reconciler.is_empty());
        // shutdown awaited the joins, so nothing is still running.
        assert_eq!(spawner.running(), 0);
    }
}
