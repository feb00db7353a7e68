//! Connectivity status indicator.
//!
//! The connection manager only sets a blink interval; the LED driver reads it
//! and toggles the pin. Interval values:
//!
//! | Interval | Meaning |
//! |----------|---------|
//! | `0` | solid on (connected) |
//! | `250` | fast blink (access-point mode) |
//! | `500` | idle / connecting |

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Solid on.
pub const BLINK_SOLID_MS: u32 = 0;

/// Fast blink while hosting the access point.
pub const BLINK_ACCESS_POINT_MS: u32 = 250;

/// Default blink period.
pub const BLINK_IDLE_MS: u32 = 500;

/// Status indicator collaborator.
pub trait StatusIndicator: Send {
    /// Set the blink period in milliseconds (`0` = solid on).
    fn set_blink_interval(&self, ms: u32);
}

/// Blink interval shared between the manager and the LED driver.
///
/// Clones share the same value.
#[derive(Debug, Clone)]
pub struct SharedBlinkInterval {
    interval_ms: Arc<AtomicU32>,
}

impl SharedBlinkInterval {
    /// Start at [`BLINK_IDLE_MS`].
    pub fn new() -> Self {
        Self {
            interval_ms: Arc::new(AtomicU32::new(BLINK_IDLE_MS)),
        }
    }

    /// Current blink period.
    pub fn get(&self) -> u32 {
        self.interval_ms.load(Ordering::Acquire)
    }
}

impl Default for SharedBlinkInterval {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator for SharedBlinkInterval {
    fn set_blink_interval(&self, ms: u32) {
        self.interval_ms.store(ms, Ordering::Release);
    }
}

/// Blink timer for the status LED.
///
/// Call [`update`](Self::update) from the LED loop with a monotonic
/// millisecond clock; it returns the level the pin should have.
#[derive(Debug)]
pub struct StatusLed {
    interval: SharedBlinkInterval,
    last_toggle_ms: u64,
    level: bool,
}

impl StatusLed {
    pub fn new(interval: SharedBlinkInterval) -> Self {
        Self {
            interval,
            last_toggle_ms: 0,
            level: false,
        }
    }

    /// Advance the timer and return the LED level.
    pub fn update(&mut self, now_ms: u64) -> bool {
        let interval = self.interval.get();
        if interval == BLINK_SOLID_MS {
            self.level = true;
            self.last_toggle_ms = now_ms;
            return self.level;
        }
        if now_ms.saturating_sub(self.last_toggle_ms) >= u64::from(interval) {
            self.last_toggle_ms = now_ms;
            self.level = !self.level;
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_interval() {
        let shared = SharedBlinkInterval::new();
        let clone = shared.clone();
        assert_eq!(shared.get(), BLINK_IDLE_MS);

        clone.set_blink_interval(BLINK_ACCESS_POINT_MS);
        assert_eq!(shared.get(), BLINK_ACCESS_POINT_MS);
    }

    #[test]
    fn test_led_solid() {
        let shared = SharedBlinkInterval::new();
        shared.set_blink_interval(BLINK_SOLID_MS);
        let mut led = StatusLed::new(shared);
        assert!(led.update(0));
        assert!(led.update(10_000));
    }

    #[test]
    fn test_led_blinks_at_interval() {
        let shared = SharedBlinkInterval::new();
        shared.set_blink_interval(BLINK_ACCESS_POINT_MS);
        let mut led = StatusLed::new(shared);

        assert!(!led.update(100));
        assert!(led.update(250));
        assert!(led.update(400));
        assert!(!led.update(500));
        assert!(led.update(750));
    }

    #[test]
    fn test_led_follows_interval_change() {
        let shared = SharedBlinkInterval::new();
        let mut led = StatusLed::new(shared.clone());
        assert!(led.update(500));

        shared.set_blink_interval(BLINK_SOLID_MS);
        assert!(led.update(600));
        shared.set_blink_interval(BLINK_IDLE_MS);
        assert!(led.update(700));
        assert!(!led.update(1100));
    }
}
