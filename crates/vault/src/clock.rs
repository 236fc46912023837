//! Wall-clock source for word creation times.

use std::fmt::Debug;

/// Supplies the current time in epoch milliseconds.
pub trait Clock: Debug + Send + Sync {
    /// Returns milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ANCHOR_MS;

    #[test]
    fn system_clock_is_past_the_codec_anchor() {
        assert!(SystemClock.now_millis() > ANCHOR_MS);
    }
}
