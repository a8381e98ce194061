//! Fixed-interval tickers.
//!
//! A [`Ticker`] is an owned timer handle: a period plus at most one pending
//! deadline. Arming replaces the deadline, disarming drops it, so a ticker can
//! never have two subscriptions at once. The async driver sleeps until the
//! earliest armed deadline and hands the firing source back to the session;
//! any command that arrives first drops that sleep, which is how a pause
//! discards the rest of the current second.
//!
//! There is no drift correction beyond re-arming from "now" whenever a
//! ticker's governing condition is re-entered.

use std::time::Duration;

use tokio::time::Instant;

/// Which ticker fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerSource {
    /// Main one-second clock, armed while a phase is running.
    Clock,
    /// Pre-round countdown, armed while counting down.
    Countdown,
    /// Periodic combo callouts, armed by the scheduler.
    Coach,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    deadline: Option<Instant>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// One tick per second.
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Schedule the next tick one period from now, replacing any pending one.
    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    pub fn arm_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    /// Arm only if not already armed. Returns whether a new deadline was set.
    pub fn ensure_armed(&mut self) -> bool {
        if self.is_armed() {
            return false;
        }
        self.arm();
        true
    }

    /// Cancel the pending tick. Returns whether one was pending.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Move a fired deadline forward by exactly one period.
    pub fn advance(&mut self) {
        if let Some(deadline) = self.deadline {
            self.deadline = Some(deadline + self.period);
        }
    }
}

/// Earliest armed deadline among `tickers`. Ties resolve in [`TimerSource`] order.
pub fn earliest<'a, I>(tickers: I) -> Option<(Instant, TimerSource)>
where
    I: IntoIterator<Item = (TimerSource, &'a Ticker)>,
{
    tickers
        .into_iter()
        .filter_map(|(source, ticker)| ticker.deadline().map(|d| (d, source)))
        .min()
}
