// Periodic view refresh.
//
// Each tick reloads every configured view and publishes the result as a new
// immutable snapshot. Consumers swap their whole snapshot on receipt and
// never see a view mid-update. A failed reload keeps the previous snapshot.
// Loads do file I/O and run on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::loader::{ViewSet, ViewSource};

/// Reload `source` every `interval` and send each snapshot through `tx`.
///
/// The first load happens immediately. Returns once the receiving side of
/// `tx` is dropped.
pub async fn run<S: ViewSource>(
    source: Arc<S>,
    interval: Duration,
    tx: mpsc::Sender<Arc<ViewSet>>,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("refresh loop started, interval {:?}", interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let loading = Arc::clone(&source);
                match tokio::task::spawn_blocking(move || loading.load()).await {
                    Ok(Ok(set)) => {
                        let counts: Vec<String> = set
                            .views
                            .iter()
                            .map(|(kind, view)| format!("{kind}={}", view.len()))
                            .collect();
                        info!("refreshed views: {}", counts.join(", "));
                        if tx.send(Arc::new(set)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        warn!("refresh failed, keeping previous snapshot: {}", e);
                    }
                    Err(e) => {
                        warn!("refresh task failed, keeping previous snapshot: {}", e);
                    }
                }
            }
            _ = tx.closed() => {
                break;
            }
        }
    }

    info!("snapshot receiver dropped, refresh loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadError;
    use frcscout_core::{Record, TeamId, View, ViewKind};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    /// Returns an average view with one row per call so far; the second call
    /// fails.
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ViewSource for CountingSource {
        fn load(&self) -> Result<ViewSet, LoadError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                return Err(LoadError::NotConfigured("average".into()));
            }
            let records = (0..n).map(|i| Record::new(TeamId::new(i.to_string()))).collect();
            let mut views = HashMap::new();
            views.insert(ViewKind::Average, View::new(ViewKind::Average, vec![], records));
            Ok(ViewSet::new(views))
        }
    }

    fn source() -> Arc<CountingSource> {
        Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reload_is_skipped() {
        let src = source();
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(run(Arc::clone(&src), Duration::from_secs(30), tx));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.get(ViewKind::Average).unwrap().len(), 1);

        // Call 2 fails, so the next snapshot comes from call 3.
        let next = rx.recv().await.unwrap();
        assert_eq!(next.get(ViewKind::Average).unwrap().len(), 3);
        assert_eq!(src.calls.load(Ordering::SeqCst), 3);

        drop(rx);
        handle.await.unwrap().unwrap();
    }

    /// Records which thread ran `load`.
    #[derive(Default)]
    struct ThreadRecordingSource {
        loaded_on: Mutex<Option<ThreadId>>,
    }

    impl ViewSource for ThreadRecordingSource {
        fn load(&self) -> Result<ViewSet, LoadError> {
            *self.loaded_on.lock().unwrap() = Some(thread::current().id());
            Ok(ViewSet::new(HashMap::new()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loads_run_off_the_runtime_thread() {
        let src = Arc::new(ThreadRecordingSource::default());
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(run(Arc::clone(&src), Duration::from_secs(30), tx));

        rx.recv().await.unwrap();
        let loaded_on = src.loaded_on.lock().unwrap().unwrap();
        assert_ne!(loaded_on, thread::current().id());

        drop(rx);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = run(source(), Duration::from_secs(1), tx).await;
        assert!(result.is_ok());
    }
}
