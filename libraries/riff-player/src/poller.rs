//! Position polling timer
//!
//! A repeating tokio task that sends a tick every period. It exists only
//! while the player is playing: `stop` aborts the task, so a paused or
//! stopped player issues no engine queries at all.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::trace;

/// Cancellable repeating poll timer
#[derive(Debug)]
pub struct PositionPoller {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl PositionPoller {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking into `ticks` (no-op if already running)
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, ticks: mpsc::Sender<()>) {
        if self.is_running() {
            return;
        }

        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if ticks.send(()).await.is_err() {
                    break;
                }
            }
        }));
        trace!(period_ms = period.as_millis() as u64, "Position poller started");
    }

    /// Abort the timer task
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            trace!("Position poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PositionPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_period_while_running() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut poller = PositionPoller::new(Duration::from_millis(100));

        poller.start(tx);
        assert!(poller.is_running());

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_ticks() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut poller = PositionPoller::new(Duration::from_millis(100));

        poller.start(tx);
        assert_eq!(rx.recv().await, Some(()));

        poller.stop();
        assert!(!poller.is_running());

        // The aborted task dropped its sender, so the channel closes
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let (tx, _rx) = mpsc::channel(1);
        let mut poller = PositionPoller::new(Duration::from_millis(50));

        poller.start(tx.clone());
        poller.start(tx);
        assert!(poller.is_running());

        poller.stop();
        assert!(!poller.is_running());
    }
}
