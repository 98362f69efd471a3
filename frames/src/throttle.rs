//! Outbound input throttle.
//!
//! `move` samples arrive far faster than the peer channel needs them. At most
//! one `move` is let through per window; `start` and `end` always pass and
//! restart the window.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use crate::message::Message;

/// Minimum spacing between two forwarded `move` messages (~60 Hz).
pub const MOVE_INTERVAL_MS: f64 = 16.0;

/// Throttle decision state. Timestamps are milliseconds from any monotonic
/// origin chosen by the caller.
#[derive(Debug, Clone)]
pub struct MoveThrottle {
    interval_ms: f64,
    last_sent_ms: Option<f64>,
}

impl Default for MoveThrottle {
    fn default() -> Self {
        Self::new(MOVE_INTERVAL_MS)
    }
}

impl MoveThrottle {
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms, last_sent_ms: None }
    }

    /// Decide whether `message` goes out at `now_ms`, recording it if so.
    ///
    /// Only [`Message::Move`] is ever dropped.
    pub fn admit(&mut self, message: &Message, now_ms: f64) -> bool {
        if matches!(message, Message::Move(_))
            && let Some(last) = self.last_sent_ms
            && now_ms - last < self.interval_ms
        {
            return false;
        }
        self.last_sent_ms = Some(now_ms);
        true
    }

    /// Forget the last send time.
    pub fn reset(&mut self) {
        self.last_sent_ms = None;
    }
}
