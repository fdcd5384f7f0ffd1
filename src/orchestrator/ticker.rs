//! Scoped periodic timer driving the countdown.

use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// At most one interval is ever outstanding. When disarmed, [`Ticker::tick`] never resolves,
/// so it can sit in a `select!` branch unconditionally.
pub(crate) struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start a fresh interval, dropping any previous one first.
    /// The first tick fires one full period from now.
    pub(crate) fn arm(&mut self) {
        self.interval = None;
        let mut iv = interval_at(Instant::now() + self.period, self.period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(iv);
        debug!(period = ?self.period, "tick timer armed");
    }

    pub(crate) fn disarm(&mut self) {
        if self.interval.take().is_some() {
            debug!("tick timer disarmed");
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub(crate) async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(iv) => {
                iv.tick().await;
            }
            None => futures::future::pending::<()>().await,
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.arm();
        let started = Instant::now();
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_ticker_never_fires() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        assert!(!ticker.is_armed());
        let fired = tokio::time::timeout(Duration::from_secs(5), ticker.tick()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_period() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.arm();
        tokio::time::sleep(Duration::from_millis(700)).await;
        ticker.arm();
        let rearmed = Instant::now();
        ticker.tick().await;
        assert_eq!(rearmed.elapsed(), Duration::from_secs(1));

        ticker.disarm();
        assert!(!ticker.is_armed());
    }
}
