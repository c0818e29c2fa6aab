use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// A recurring job: first run after `initial_delay`, then every `period`.
/// Dropping or cancelling the handle stops the timers. A run already in
/// progress is never interrupted; it finishes and no further run starts.
#[derive(Debug)]
pub struct Schedule {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl Schedule {
    /// Start the timers. A run that is still going when the next tick comes
    /// delays that tick rather than overlapping it.
    pub fn spawn<F, Fut>(initial_delay: Duration, period: Duration, parent: &CancellationToken, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(initial_delay) => {}
                _ = token.cancelled() => return,
            }
            job().await;

            let period = period.max(Duration::from_millis(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = token.cancelled() => break,
                }
                if token.is_cancelled() {
                    break;
                }
                job().await;
            }
            tracing::debug!("⏹️ Schedule stopped");
        });

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel and wait for the timer task to exit, including a run in progress.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                tracing::error!("Schedule task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_schedule(initial: Duration, period: Duration, parent: &CancellationToken) -> (Schedule, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let schedule = Schedule::spawn(initial, period, parent, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (schedule, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_then_interval() {
        let parent = CancellationToken::new();
        let (schedule, runs) = counting_schedule(Duration::from_secs(20), Duration::from_secs(600), &parent);

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(1200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);

        schedule.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_run() {
        let parent = CancellationToken::new();
        let (schedule, runs) = counting_schedule(Duration::from_secs(20), Duration::from_secs(600), &parent);

        tokio::time::sleep(Duration::from_secs(5)).await;
        schedule.shutdown().await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_running_job_finish() {
        let parent = CancellationToken::new();
        let started = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));

        let (s, r, f) = (started.clone(), release.clone(), finished.clone());
        let schedule = Schedule::spawn(Duration::from_secs(1), Duration::from_secs(10), &parent, move || {
            let (s, r, f) = (s.clone(), r.clone(), f.clone());
            async move {
                s.notify_one();
                r.notified().await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        });

        started.notified().await;
        let stopping = tokio::spawn(schedule.shutdown());
        tokio::task::yield_now().await;
        assert!(!stopping.is_finished());

        release.notify_one();
        stopping.await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_timers() {
        let parent = CancellationToken::new();
        let (schedule, runs) = counting_schedule(Duration::from_secs(1), Duration::from_secs(10), &parent);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        parent.cancel();
        assert!(schedule.is_cancelled());
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
