//! Long press detection
//!
//! The touch controller repeats the long press gesture on every report while
//! the finger stays down. [`HoldLatch`] turns that stream into one event per
//! hold.

use core::time::Duration;

/// Silence after which a hold counts as released even without a lift report
pub const RELEASE_AFTER: Duration = Duration::from_millis(300);

#[derive(Debug, Default)]
pub struct HoldLatch {
    last_seen: Option<Duration>,
}

impl HoldLatch {
    pub const fn new() -> Self {
        Self { last_seen: None }
    }

    /// Feed one touch report taken at `uptime`.
    ///
    /// Returns `true` only for the first long press report of a hold.
    pub fn report(&mut self, long_press: bool, uptime: Duration) -> bool {
        if let Some(seen) = self.last_seen {
            if uptime.saturating_sub(seen) > RELEASE_AFTER {
                self.last_seen = None;
            }
        }
        if !long_press {
            self.last_seen = None;
            return false;
        }
        let first = self.last_seen.is_none();
        self.last_seen = Some(uptime);
        first
    }
}
