//! One-shot timers re-armed after every router pass

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep, sleep_until};

/// Interval of the periodic telemetry tick.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// One-shot deadline that the owner re-arms after each pass.
///
/// The deadline fires once; it stays quiet until [`rearm`](Self::rearm) is
/// called again. If the owner ever stops re-arming, the wake-ups stop with it.
#[derive(Debug)]
pub struct PeriodicRearmer {
    interval: Duration,
    deadline: Pin<Box<Sleep>>,
    armed: bool,
}

impl PeriodicRearmer {
    /// Create a timer armed to fire one `interval` from now.
    pub fn new(interval: Duration) -> Self {
        Self { interval, deadline: Box::pin(sleep_until(deadline_after(interval))), armed: true }
    }

    /// Schedule the next wake-up one interval from now, replacing any pending one.
    pub fn rearm(&mut self) {
        self.deadline.as_mut().reset(deadline_after(self.interval));
        self.armed = true;
    }

    /// Wait for the deadline. Pending forever while disarmed.
    ///
    /// Cancel safe: dropping the future keeps the deadline armed.
    pub async fn expired(&mut self) {
        if !self.armed {
            std::future::pending::<()>().await;
        }
        self.deadline.as_mut().await;
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next wake-up is due, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.then(|| self.deadline.deadline())
    }
}

/// Roughly 30 years, used when an interval does not fit the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + interval`, saturating at [`FAR_FUTURE`] instead of overflowing.
fn deadline_after(interval: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(interval).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Wait on an optional timer; pending forever when there is none.
pub async fn expired(timer: &mut Option<PeriodicRearmer>) {
    match timer {
        Some(timer) => timer.expired().await,
        None => std::future::pending().await,
    }
}
