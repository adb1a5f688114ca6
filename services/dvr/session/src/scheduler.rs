//! Advertisement timer.
//!
//! A single reusable one-shot deadline. The protocol handler polls
//! [`AdvertisementScheduler::expired`] in the same `select!` loop that reads
//! packets, so firing, re-arming and cancelling never race with packet
//! processing. Re-arming resets the existing timer in place.

use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep_until, Instant, Sleep};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    /// Not armed yet, or fired and not re-armed
    Idle,
    /// Waiting for the deadline
    Armed,
    /// Stopped for good
    Cancelled,
}

/// Cancellable periodic/triggered advertisement timer
#[derive(Debug)]
pub struct AdvertisementScheduler {
    interval: Duration,
    sleep: Pin<Box<Sleep>>,
    state: TimerState,
}

impl AdvertisementScheduler {
    /// Create an idle scheduler
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            sleep: Box::pin(sleep_until(Instant::now() + interval)),
            state: TimerState::Idle,
        }
    }

    /// Time between periodic advertisements
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the first deadline for right now, so the initial vector goes out
    /// as soon as the session is active
    pub fn start(&mut self) {
        self.arm_at(Instant::now());
    }

    /// Drop any pending deadline and arm a fresh one `interval` from now
    pub fn rearm(&mut self) {
        self.arm_at(Instant::now() + self.interval);
    }

    /// Stop the timer permanently; a pending deadline will never fire
    pub fn cancel(&mut self) {
        if self.state != TimerState::Cancelled {
            debug!(component = "scheduler", "Advertisement timer cancelled");
        }
        self.state = TimerState::Cancelled;
    }

    /// Whether a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.state == TimerState::Armed
    }

    /// Whether the timer has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.state == TimerState::Cancelled
    }

    /// Pending deadline, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.is_armed().then(|| self.sleep.deadline())
    }

    /// Wait for the armed deadline.
    ///
    /// Never completes while idle or cancelled. Cancel-safe: dropping the
    /// future leaves the deadline armed. After completion the timer is idle
    /// until re-armed.
    pub async fn expired(&mut self) {
        if self.state != TimerState::Armed {
            std::future::pending::<()>().await;
        }
        self.sleep.as_mut().await;
        self.state = TimerState::Idle;
    }

    fn arm_at(&mut self, deadline: Instant) {
        if self.state == TimerState::Cancelled {
            return;
        }
        self.sleep.as_mut().reset(deadline);
        self.state = TimerState::Armed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_start_fires_immediately() {
        let mut scheduler = AdvertisementScheduler::new(Duration::from_millis(500));
        let begin = Instant::now();

        scheduler.start();
        scheduler.expired().await;

        assert_eq!(Instant::now(), begin);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_from_now() {
        let mut scheduler = AdvertisementScheduler::new(Duration::from_millis(1000));
        let begin = Instant::now();
        scheduler.rearm();

        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.rearm();
        scheduler.expired().await;

        assert_eq!(Instant::now() - begin, Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timer_never_fires() {
        let mut scheduler = AdvertisementScheduler::new(Duration::from_millis(10));

        let fired = tokio::time::timeout(Duration::from_secs(5), scheduler.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing_and_rearming() {
        let mut scheduler = AdvertisementScheduler::new(Duration::from_millis(10));
        scheduler.start();
        scheduler.cancel();
        scheduler.rearm();

        assert!(scheduler.is_cancelled());
        assert_eq!(scheduler.deadline(), None);
        let fired = tokio::time::timeout(Duration::from_secs(5), scheduler.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_keeps_deadline() {
        let mut scheduler = AdvertisementScheduler::new(Duration::from_millis(100));
        let begin = Instant::now();
        scheduler.rearm();

        let early = tokio::time::timeout(Duration::from_millis(40), scheduler.expired()).await;
        assert!(early.is_err());
        assert!(scheduler.is_armed());

        scheduler.expired().await;
        assert_eq!(Instant::now() - begin, Duration::from_millis(100));
    }
}
