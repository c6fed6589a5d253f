//! Serial execution context
//!
//! Every mutation of entertainment state runs as a job on one worker task, so
//! state transitions are totally ordered without per-object locking. Delayed and
//! periodic jobs are timers that enqueue onto the same worker when they fire.
//!
//! A [`ScheduledTask`] is owned by whoever scheduled it and must be cancelled
//! explicitly; dropping the handle leaves the timer running. Cancellation is
//! checked again on the worker, so a job that was already queued when `cancel`
//! ran is skipped.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a single-worker job queue
#[derive(Clone)]
pub struct SerialScheduler {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Job>,
}

impl SerialScheduler {
    /// Spawn the worker task. Must be called from within a tokio runtime.
    pub fn spawn(name: &str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker_name = name.to_string();

        tokio::spawn(async move {
            debug!("Serial worker '{}' started", worker_name);
            while let Some(job) = rx.recv().await {
                job();
            }
            debug!("Serial worker '{}' stopped", worker_name);
        });

        Self {
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue a job behind everything already queued
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(job))
            .map_err(|_| Error::Internal(format!("serial worker '{}' is gone", self.name)))
    }

    /// Enqueue a job and wait for its return value
    pub async fn submit<F, R>(&self, job: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.execute(move || {
            let _ = tx.send(job());
        })?;
        rx.await
            .map_err(|_| Error::Internal(format!("serial worker '{}' dropped a job", self.name)))
    }

    /// Run `job` on the worker after `delay`
    pub fn schedule<F>(&self, delay: Duration, job: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Box::new(move || {
                if !flag.load(Ordering::Acquire) {
                    job();
                }
            }));
        });

        ScheduledTask { cancelled, timer }
    }

    /// Run `job` on the worker after `initial`, then every `period`
    ///
    /// A zero `period` is rejected with [`Error::IllegalArgument`].
    pub fn schedule_periodic<F>(
        &self,
        initial: Duration,
        period: Duration,
        job: F,
    ) -> Result<ScheduledTask>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if period.is_zero() {
            return Err(Error::IllegalArgument(format!(
                "periodic job on '{}' needs a non-zero period",
                self.name
            )));
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();
        let job = Arc::new(job);

        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + initial, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let job = Arc::clone(&job);
                let flag = Arc::clone(&flag);
                let queued = tx.send(Box::new(move || {
                    if !flag.load(Ordering::Acquire) {
                        job();
                    }
                }));
                if queued.is_err() {
                    break;
                }
            }
        });

        Ok(ScheduledTask { cancelled, timer })
    }
}

/// Cancelable delayed or periodic job
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

impl ScheduledTask {
    /// Stop the timer; a firing already queued on the worker is skipped
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.timer.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_jobs_run_in_submission_order() {
        let scheduler = SerialScheduler::spawn("test");
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let log = Arc::clone(&log);
            scheduler.execute(move || log.lock().push(i)).unwrap();
        }
        scheduler.submit(|| ()).await.unwrap();

        assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_submit_returns_value() {
        let scheduler = SerialScheduler::spawn("test");
        let value = scheduler.submit(|| 6 * 7).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_job_fires_after_delay() {
        let scheduler = SerialScheduler::spawn("test");
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let _task = scheduler.schedule(Duration::from_secs(1), move || {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(2)).await;
        scheduler.submit(|| ()).await.unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_fires() {
        let scheduler = SerialScheduler::spawn("test");
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let task = scheduler.schedule(Duration::from_millis(100), move || {
            flag.store(true, Ordering::SeqCst);
        });
        task.cancel();
        assert!(task.is_cancelled());

        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.submit(|| ()).await.unwrap();
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_job_ticks_until_cancelled() {
        let scheduler = SerialScheduler::spawn("test");
        let ticks = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&ticks);

        let task = scheduler
            .schedule_periodic(Duration::ZERO, Duration::from_secs(10), move || {
                *counter.lock() += 1;
            })
            .unwrap();

        // t=0, t=10, t=20
        tokio::time::sleep(Duration::from_secs(25)).await;
        scheduler.submit(|| ()).await.unwrap();
        assert_eq!(*ticks.lock(), 3);

        task.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        scheduler.submit(|| ()).await.unwrap();
        assert_eq!(*ticks.lock(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_rejected() {
        let scheduler = SerialScheduler::spawn("test");
        let result = scheduler.schedule_periodic(Duration::ZERO, Duration::ZERO, || ());
        assert!(matches!(result, Err(Error::IllegalArgument(_))));

        // The worker is unaffected
        assert_eq!(scheduler.submit(|| 1).await.unwrap(), 1);
    }
}
