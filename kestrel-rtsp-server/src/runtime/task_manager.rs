use std::future::Future;

use tokio::spawn;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

/// Keeps track of spawned tasks so that they can all be asked to stop and
/// waited for.
pub struct TaskManager {
    hold_tx: Mutex<Option<mpsc::Sender<()>>>,
    hold_rx: Mutex<mpsc::Receiver<()>>,
    stop_tx: broadcast::Sender<()>,
}

impl TaskManager {
    pub fn new() -> Self {
        let (hold_tx, hold_rx) = mpsc::channel(1);
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            // Must protect by mutex since another task might invalidate the
            // `hold_tx` once shutdown begins.
            hold_tx: Mutex::new(Some(hold_tx)),
            // Must protect `hold_rx` by mutex to allow for internal
            // mutability.
            hold_rx: Mutex::new(hold_rx),
            stop_tx,
        }
    }

    /// Spawn a task. Returns `false` without spawning if the manager is
    /// already stopping.
    pub async fn spawn<F, T>(&self, f: F) -> bool
    where
        F: FnOnce(TaskContext) -> T + Send + 'static,
        T: Future + Send + 'static,
        T::Output: Send + 'static,
    {
        // `hold_tx` is empty if another task already asked the manager to
        // stop, in which case no task is started at all. The lock is held
        // until the task subscribed to the stop signal so that `stop` cannot
        // send it in between.
        let hold_tx_guard = self.hold_tx.lock().await;
        let Some(hold_tx) = hold_tx_guard.as_ref().cloned() else {
            return false;
        };
        let stop_rx = self.stop_tx.subscribe();
        drop(hold_tx_guard);

        spawn(async move {
            // The context is dropped together with the future generated by
            // `f`, which releases the hold.
            let task_context = TaskContext {
                _token: hold_tx,
                stop: stop_rx,
            };

            f(task_context).await;
        });
        true
    }

    pub async fn stop(&self) {
        // If we don't drop the apex `hold_tx` here then the call to `recv()`
        // below will block forever since there would be one remaining hold.
        drop(self.hold_tx.lock().await.take());

        // This must happen after the remaining `hold_tx` is dropped, since
        // that causes further invocations of `spawn` to be ignored. A task
        // spawned after this point would never receive the stop signal.
        let _ = self.stop_tx.send(());

        // The channel breaks after all holds are dropped, which means all
        // tasks have finished.
        let _ = self.hold_rx.lock().await.recv().await;
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TaskContext {
    stop: broadcast::Receiver<()>,
    _token: mpsc::Sender<()>,
}

impl TaskContext {
    pub async fn wait_for_stop(&mut self) {
        let _ = self.stop.recv().await;
    }
}

#[cfg(test)]
mod tests {

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::TaskManager;

    #[tokio::test]
    async fn stop_waits_for_tasks() {
        let task_manager = TaskManager::new();
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let finished = finished.clone();
            assert!(
                task_manager
                    .spawn(move |mut task_context| async move {
                        task_context.wait_for_stop().await;
                        finished.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
            );
        }

        task_manager.stop().await;
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_spawn_and_stop_never_hang() {
        for _ in 0..500 {
            let task_manager = Arc::new(TaskManager::new());

            let spawner = tokio::spawn({
                let task_manager = task_manager.clone();
                async move {
                    for _ in 0..4 {
                        task_manager
                            .spawn(|mut task_context| async move {
                                task_context.wait_for_stop().await;
                            })
                            .await;
                    }
                }
            });

            // Every task that got spawned must see the stop signal, whichever
            // side wins the race.
            tokio::time::timeout(Duration::from_secs(5), task_manager.stop())
                .await
                .unwrap();
            spawner.await.unwrap();
        }
    }

    #[tokio::test]
    async fn spawn_after_stop_is_ignored() {
        let task_manager = TaskManager::new();
        task_manager.stop().await;
        assert!(!task_manager.spawn(|_| async {}).await);
    }
}
